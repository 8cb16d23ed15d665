//! Writing the DWARF version 2 debugging sections.
//!
//! Each emitter produces the payload bytes of one debug section together
//! with the relocations that bind its embedded addresses to `.text`:
//!
//! - [`line`] encodes the `.debug_line` line number program.
//! - [`aranges`] encodes the `.debug_aranges` address range table.
//! - [`info`] encodes `.debug_info` and `.debug_abbrev` from a tree of
//!   tagged entries, interning `DW_FORM_strp` strings into `.debug_str`.

pub mod aranges;
pub mod info;
pub mod line;

pub use aranges::write_aranges;
pub use info::{write_info, Attr, AttrValue, DebugInfo, InfoEntry};
pub use line::{write_line_program, LineRow};
