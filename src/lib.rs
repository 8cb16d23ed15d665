//! # `rspobj`
//!
//! The `rspobj` crate builds 32-bit MIPS relocatable object files for RSP
//! (Reality Signal Processor) microcode, including the DWARF version 2
//! debugging sections consumed by host-side debuggers.
//!
//! The crate is split along the same lines as the file format itself:
//!
//! - [`elf`] and [`dwarf`] hold the raw format definitions: constants and
//!   fixed-layout structures.
//! - [`write`] builds files: the ELF section/symbol model and serializer,
//!   the relocation tracker, and the `.debug_line` / `.debug_aranges` /
//!   `.debug_info` emitters.
//! - [`read`] decodes an existing ELF32 object, primarily so that written
//!   files can be inspected and round-trip tested.
//!
//! See [`write::elf::Builder`] for the entry point used to assemble a file.

#![deny(missing_docs)]

pub mod endian;

mod pod;
#[doc(hidden)]
pub use pod::Pod;

pub mod dwarf;
pub mod elf;
pub mod leb128;
pub mod read;
pub mod write;
