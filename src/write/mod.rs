//! Interfaces for writing object files.
//!
//! The submodules build the individual pieces of an RSP object:
//!
//! - [`elf`] holds the section/symbol model, the relocation tracker, and the
//!   ELF32 serializer.
//! - [`dwarf`] emits the `.debug_line`, `.debug_aranges`, `.debug_info`,
//!   `.debug_abbrev`, and `.debug_str` payloads.
//! - [`string`] provides the nul-terminated string tables shared by both.

use std::error;
use std::fmt;
use std::result;

pub mod dwarf;
pub mod elf;
pub mod string;

mod util;
pub use util::WritableBuffer;
pub(crate) use util::{align, write_align};

/// The error type used within the write module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error(pub(crate) String);

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl error::Error for Error {}

/// The result type used within the write module.
pub type Result<T> = result::Result<T, Error>;
