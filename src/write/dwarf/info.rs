//! Writing `.debug_info` and `.debug_abbrev`.
//!
//! The input is a tree of tagged entries with typed attribute values. Two
//! passes walk the tree in the same depth-first order: the first allocates
//! an abbreviation code per entry and serializes the abbreviation table,
//! the second serializes the entry values and collects a relocation for
//! every address-form attribute. Sharing the walk order is what keeps the
//! codes consistent between the two streams.

use crate::dwarf;
use crate::elf;
use crate::endian::{Endianness, U16, U32, U64};
use crate::leb128::write_uleb128;
use crate::write::elf::Relocations;
use crate::write::string::StringTable;
use crate::write::WritableBuffer;

/// The value of one attribute, carrying its own emission rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// An integer, stored with the given byte width.
    ///
    /// A width of 0 selects ULEB128 encoding; otherwise the width must be
    /// 1, 2, 4, or 8.
    Number {
        /// The integer value.
        value: i64,
        /// The stored width in bytes.
        size: u32,
    },
    /// A string, stored inline or as an offset into `.debug_str`.
    String {
        /// The string value.
        value: String,
        /// True to store the string inline with a nul terminator; false to
        /// intern it and store a 4 byte `.debug_str` offset.
        inline: bool,
    },
    /// A byte block, stored with a length prefix of the given width.
    Block {
        /// The block contents.
        data: Vec<u8>,
        /// The width of the length prefix; 0 selects ULEB128.
        size: u32,
    },
    /// A value whose form is stored alongside it.
    Indirect {
        /// The form of the wrapped value.
        form: u16,
        /// The wrapped value.
        value: Box<AttrValue>,
    },
}

/// One attribute of an entry: the attribute name, its form, and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The attribute name. One of the `DW_AT_*` constants.
    pub at: u16,
    /// The attribute form. One of the `DW_FORM_*` constants.
    pub form: u16,
    /// The attribute value.
    pub value: AttrValue,
}

impl Attr {
    /// A relocatable `.text` address attribute (`DW_FORM_addr`).
    pub fn addr(at: u16, value: i64) -> Attr {
        Attr {
            at,
            form: dwarf::DW_FORM_ADDR,
            value: AttrValue::Number { value, size: 4 },
        }
    }

    /// An integer constant attribute.
    ///
    /// `size` selects the form: 0 for `udata`, otherwise `data1`, `data2`,
    /// `data4`, or `data8`.
    pub fn constant(at: u16, value: i64, size: u32) -> Attr {
        let form = match size {
            0 => dwarf::DW_FORM_UDATA,
            1 => dwarf::DW_FORM_DATA1,
            2 => dwarf::DW_FORM_DATA2,
            4 => dwarf::DW_FORM_DATA4,
            _ => dwarf::DW_FORM_DATA8,
        };
        debug_assert!(matches!(size, 0 | 1 | 2 | 4 | 8));
        Attr {
            at,
            form,
            value: AttrValue::Number { value, size },
        }
    }

    /// A string attribute, inline (`DW_FORM_string`) or interned into
    /// `.debug_str` (`DW_FORM_strp`).
    pub fn string(at: u16, value: impl Into<String>, inline: bool) -> Attr {
        Attr {
            at,
            form: if inline {
                dwarf::DW_FORM_STRING
            } else {
                dwarf::DW_FORM_STRP
            },
            value: AttrValue::String {
                value: value.into(),
                inline,
            },
        }
    }

    /// A byte block attribute with a length prefix of the given width.
    ///
    /// `size` selects the form: 0 for `block`, otherwise `block1`,
    /// `block2`, or `block4`.
    pub fn block(at: u16, data: Vec<u8>, size: u32) -> Attr {
        let form = match size {
            0 => dwarf::DW_FORM_BLOCK,
            1 => dwarf::DW_FORM_BLOCK1,
            2 => dwarf::DW_FORM_BLOCK2,
            _ => dwarf::DW_FORM_BLOCK4,
        };
        debug_assert!(matches!(size, 0 | 1 | 2 | 4));
        Attr {
            at,
            form,
            value: AttrValue::Block { data, size },
        }
    }
}

/// One entry of the info tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    /// The entry tag. One of the `DW_TAG_*` constants.
    pub tag: u16,
    /// The attributes, in declaration order.
    pub attrs: Vec<Attr>,
    /// Child entries.
    pub children: Vec<InfoEntry>,
}

impl InfoEntry {
    /// Create an entry with no attributes and no children.
    pub fn new(tag: u16) -> InfoEntry {
        InfoEntry {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// The serialized output of [`write_info`].
#[derive(Debug)]
pub struct DebugInfo {
    /// The `.debug_info` contents, including the compilation unit header.
    pub info: Vec<u8>,
    /// Relocations into `.debug_info`, one per address-form attribute.
    pub relocations: Relocations,
    /// The `.debug_abbrev` contents.
    pub abbrev: Vec<u8>,
    /// The `.debug_str` contents built by interned string attributes.
    pub strings: StringTable,
}

fn write_number(result: &mut Vec<u8>, value: i64, size: u32, endian: Endianness) {
    match size {
        0 => write_uleb128(result, value as u64),
        1 => result.push(value as u8),
        2 => result.write_pod(&U16::new(endian, value as u16)),
        4 => result.write_pod(&U32::new(endian, value as u32)),
        8 => result.write_pod(&U64::new(endian, value as u64)),
        _ => {}
    }
}

fn write_value(
    value: &AttrValue,
    result: &mut Vec<u8>,
    strings: &mut StringTable,
    endian: Endianness,
) {
    match value {
        AttrValue::Number { value, size } => write_number(result, *value, *size, endian),
        AttrValue::String { value, inline } => {
            if *inline {
                result.extend_from_slice(value.as_bytes());
                result.push(0);
            } else {
                let offset = strings.add(value.as_bytes());
                result.write_pod(&U32::new(endian, offset));
            }
        }
        AttrValue::Block { data, size } => {
            write_number(result, data.len() as i64, *size, endian);
            result.extend_from_slice(data);
        }
        AttrValue::Indirect { form, value } => {
            write_uleb128(result, u64::from(*form));
            write_value(value, result, strings, endian);
        }
    }
}

/// Serialize one sibling list of the abbreviation table, assigning codes
/// depth-first from `*code`.
fn write_abbrev(entries: &[InfoEntry], result: &mut Vec<u8>, code: &mut u64) {
    for entry in entries {
        write_uleb128(result, *code);
        *code += 1;
        write_uleb128(result, u64::from(entry.tag));
        result.push(u8::from(!entry.children.is_empty()));

        for attr in &entry.attrs {
            write_uleb128(result, u64::from(attr.at));
            write_uleb128(result, u64::from(attr.form));
        }
        result.push(0);
        result.push(0);

        if !entry.children.is_empty() {
            write_abbrev(&entry.children, result, code);
        }
    }
    result.push(0);
}

/// Serialize one sibling list of the info stream, repeating the abbreviation
/// pass's walk so the consumed codes line up.
fn write_entries(
    entries: &[InfoEntry],
    result: &mut Vec<u8>,
    relocations: &mut Relocations,
    strings: &mut StringTable,
    endian: Endianness,
    code: &mut u64,
) {
    for entry in entries {
        write_uleb128(result, *code);
        *code += 1;

        for attr in &entry.attrs {
            if attr.form == dwarf::DW_FORM_ADDR {
                relocations.add(result.len() as u32, &b".text"[..], elf::R_MIPS_32);
            }
            write_value(&attr.value, result, strings, endian);
        }

        write_entries(&entry.children, result, relocations, strings, endian, code);
    }
}

/// Emit `.debug_info` and `.debug_abbrev` for the given entry tree.
///
/// The info stream is wrapped in a compilation unit header (DWARF version
/// 2, abbreviation table offset 0, address size 4), and the collected
/// relocations are expressed relative to the section start.
pub fn write_info(entries: &[InfoEntry], endian: Endianness) -> DebugInfo {
    let mut abbrev = Vec::new();
    let mut code = 1;
    write_abbrev(entries, &mut abbrev, &mut code);

    let mut info = Vec::new();
    let mut relocations = Relocations::new();
    let mut strings = StringTable::new();
    let mut code = 1;
    write_entries(
        entries,
        &mut info,
        &mut relocations,
        &mut strings,
        endian,
        &mut code,
    );

    let mut result = Vec::new();
    result.write_pod(&U32::new(endian, info.len() as u32 + 7));
    result.write_pod(&U16::new(endian, 2));
    result.write_pod(&U32::new(endian, 0)); // abbreviation table offset
    result.push(4); // address size
    relocations.shift(result.len() as u32);
    result.extend_from_slice(&info);

    DebugInfo {
        info: result,
        relocations,
        abbrev,
        strings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_unit(text_length: i64) -> InfoEntry {
        InfoEntry {
            tag: dwarf::DW_TAG_COMPILE_UNIT,
            attrs: vec![
                Attr::constant(dwarf::DW_AT_STMT_LIST, 0, 4),
                Attr::addr(dwarf::DW_AT_LOW_PC, 0),
                Attr::addr(dwarf::DW_AT_HIGH_PC, text_length),
                Attr::string(dwarf::DW_AT_NAME, "x.s", false),
                Attr::string(dwarf::DW_AT_COMP_DIR, "/", false),
                Attr::string(dwarf::DW_AT_PRODUCER, "rspasm", false),
                Attr::constant(dwarf::DW_AT_LANGUAGE, 0x8001, 2),
            ],
            children: Vec::new(),
        }
    }

    #[test]
    fn compile_unit_abbrev() {
        let output = write_info(&[compile_unit(0x40)], Endianness::Big);

        assert_eq!(
            output.abbrev,
            [
                0x01, 0x11, 0x00, // code 1, compile_unit, no children
                0x10, 0x06, // stmt_list, data4
                0x11, 0x01, // low_pc, addr
                0x12, 0x01, // high_pc, addr
                0x03, 0x0e, // name, strp
                0x1b, 0x0e, // comp_dir, strp
                0x25, 0x0e, // producer, strp
                0x13, 0x05, // language, data2
                0x00, 0x00, // end of attributes
                0x00, // end of the sibling list
            ]
        );
    }

    #[test]
    fn compile_unit_info() {
        let output = write_info(&[compile_unit(0x40)], Endianness::Big);

        // 1 code byte + 4 + 4 + 4 + 4 + 4 + 4 + 2 attribute bytes, plus the
        // 7 header bytes counted by unit_length.
        assert_eq!(&output.info[0..4], &[0, 0, 0, 34]);
        assert_eq!(&output.info[4..6], &[0, 2]);
        assert_eq!(&output.info[6..10], &[0; 4]);
        assert_eq!(output.info[10], 4);
        assert_eq!(output.info.len(), 11 + 27);

        // Entry code, then stmt_list = 0.
        assert_eq!(output.info[11], 1);
        assert_eq!(&output.info[12..16], &[0; 4]);
        // low_pc 0, high_pc 0x40.
        assert_eq!(&output.info[16..20], &[0; 4]);
        assert_eq!(&output.info[20..24], &[0, 0, 0, 0x40]);
        // Interned string offsets: "x.s" at 1, "/" at 5, "rspasm" at 7.
        assert_eq!(&output.info[24..28], &[0, 0, 0, 1]);
        assert_eq!(&output.info[28..32], &[0, 0, 0, 5]);
        assert_eq!(&output.info[32..36], &[0, 0, 0, 7]);
        // language data2.
        assert_eq!(&output.info[36..38], &[0x80, 0x01]);

        assert_eq!(output.strings.data(), b"\0x.s\0/\0rspasm\0");
    }

    #[test]
    fn address_forms_collect_relocations() {
        let output = write_info(&[compile_unit(0x40)], Endianness::Big);

        let entries = output.relocations.entries();
        assert_eq!(entries.len(), 2);
        // low_pc directly after the code and stmt_list bytes, high_pc after
        // the low_pc word, both shifted by the 11 byte unit header.
        assert_eq!(entries[0].r_offset, 16);
        assert_eq!(entries[1].r_offset, 20);
        for entry in entries {
            assert_eq!(entry.symbol, b".text");
            assert_eq!(entry.r_type, elf::R_MIPS_32);
        }
    }

    #[test]
    fn nested_entries_get_sequential_codes() {
        let mut parent = InfoEntry::new(dwarf::DW_TAG_COMPILE_UNIT);
        parent.attrs.push(Attr::string(dwarf::DW_AT_NAME, "p", true));
        let mut child = InfoEntry::new(dwarf::DW_TAG_SUBPROGRAM);
        child.attrs.push(Attr::string(dwarf::DW_AT_NAME, "c", true));
        parent.children.push(child);

        let output = write_info(&[parent], Endianness::Big);

        assert_eq!(
            output.abbrev,
            [
                0x01, 0x11, 0x01, // code 1, compile_unit, has children
                0x03, 0x08, // name, string
                0x00, 0x00, // end of attributes
                0x02, 0x2e, 0x00, // code 2, subprogram, no children
                0x03, 0x08, // name, string
                0x00, 0x00, // end of attributes
                0x00, // end of the child list
                0x00, // end of the sibling list
            ]
        );

        // Info stream: code 1, "p", code 2, "c".
        assert_eq!(&output.info[11..], &[1, b'p', 0, 2, b'c', 0]);
    }

    #[test]
    fn block_and_indirect_values() {
        let mut entry = InfoEntry::new(dwarf::DW_TAG_VARIABLE);
        entry
            .attrs
            .push(Attr::block(dwarf::DW_AT_LOCATION, vec![0x91, 0x7c], 1));
        entry.attrs.push(Attr {
            at: dwarf::DW_AT_BYTE_SIZE,
            form: dwarf::DW_FORM_INDIRECT,
            value: AttrValue::Indirect {
                form: dwarf::DW_FORM_DATA1,
                value: Box::new(AttrValue::Number { value: 8, size: 1 }),
            },
        });

        let output = write_info(&[entry], Endianness::Big);

        // code, block1 length + contents, indirect form + data1 value.
        assert_eq!(&output.info[11..], &[1, 2, 0x91, 0x7c, 0x0b, 8]);
    }

    #[test]
    fn uleb_sized_number() {
        let mut entry = InfoEntry::new(dwarf::DW_TAG_VARIABLE);
        entry
            .attrs
            .push(Attr::constant(dwarf::DW_AT_BYTE_SIZE, 300, 0));

        let output = write_info(&[entry], Endianness::Big);
        assert_eq!(&output.info[11..], &[1, 0xac, 0x02]);
    }
}
