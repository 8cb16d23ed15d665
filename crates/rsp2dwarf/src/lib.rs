//! Build an ELF32 MIPS relocatable object from assembled RSP microcode.
//!
//! The input is the raw instruction stream produced by rspasm, with its
//! companion files: `<input>.dat` (the data segment) and, when debug
//! output is requested, `<input>.sym` (source line records) and
//! `<input>.dbg` (label addresses). The output object carries `.text`,
//! `.data`, start/end marker symbols for the linker, and optionally the
//! DWARF version 2 sections understood by host-side debuggers.

#![warn(missing_docs)]

mod error;
pub use error::{Error, ErrorKind, Result};

pub mod symfile;

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use rspobj::dwarf;
use rspobj::elf;
use rspobj::endian::Endianness;
use rspobj::write::dwarf::{
    write_aranges, write_info, write_line_program, Attr, InfoEntry, LineRow,
};
use rspobj::write::elf::{Builder, Section, Symbol};

use symfile::SymbolDef;

// Conventional MIPS e_flags for the RSP target.
const RSP_E_FLAGS: u32 = 0x2000_0101;
const PRODUCER: &str = "rspasm";

/// The debug information parsed from the `.sym` and `.dbg` files.
#[derive(Debug, Clone)]
pub struct DebugInput {
    /// Line table rows from the `.sym` file.
    pub rows: Vec<LineRow>,
    /// Instruction symbols from the `.dbg` file.
    pub instruction_symbols: Vec<SymbolDef>,
    /// Data symbols from the `.dbg` file.
    pub data_symbols: Vec<SymbolDef>,
    /// Compilation directory recorded in the compile unit.
    pub comp_dir: String,
}

/// Derive the linker name prefix from the input file name.
///
/// The base name loses its extension, every character that is not
/// alphanumeric becomes `_`, and a `_` is prepended when the first
/// character is not a letter.
pub fn link_name_from_path(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut output = String::with_capacity(stem.len() + 1);
    if !stem.starts_with(|c: char| c.is_ascii_alphabetic()) {
        output.push('_');
    }
    for character in stem.chars() {
        if character.is_ascii_alphanumeric() {
            output.push(character);
        } else {
            output.push('_');
        }
    }
    output
}

fn dwarf_section(name: &[u8], data: Vec<u8>) -> Section {
    let mut section = Section::new(name, elf::SHT_MIPS_DWARF);
    section.sh_addralign = 1;
    section.data = data;
    section
}

fn global_symbol(name: String, st_type: u8, value: u32, size: u32, shndx: u16) -> Symbol {
    Symbol {
        name: name.into_bytes(),
        st_value: value,
        st_size: size,
        st_bind: elf::STB_GLOBAL,
        st_type,
        st_other: 0,
        st_shndx: shndx,
    }
}

/// Append the DWARF sections and their relocation tables.
fn append_debug_sections(builder: &mut Builder, debug: &DebugInput, text_length: u32) -> Result<()> {
    let endian = builder.endian;

    // Only section-relative symbols are referenced from the debug sections,
    // and those always land at the same well-known indices.
    let symbol_map = HashMap::from([(b".text".to_vec(), 1u32), (b".data".to_vec(), 2u32)]);

    let first_file = match debug.rows.first() {
        Some(row) => row.file.clone(),
        None => {
            return Err(Error::malformed(
                "The .sym file contains no line records",
            ))
        }
    };

    let (line_data, line_relocations) =
        write_line_program(&debug.rows, endian).map_err(Error::from)?;
    builder.add_section(dwarf_section(b".debug_line", line_data));
    builder.add_section(line_relocations.to_section(b".debug_line", &symbol_map, endian));

    let (aranges_data, aranges_relocations) = write_aranges(text_length, endian);
    builder.add_section(dwarf_section(b".debug_aranges", aranges_data));
    builder.add_section(aranges_relocations.to_section(b".debug_aranges", &symbol_map, endian));

    let compile_unit = InfoEntry {
        tag: dwarf::DW_TAG_COMPILE_UNIT,
        attrs: vec![
            Attr::constant(dwarf::DW_AT_STMT_LIST, 0, 4),
            Attr::addr(dwarf::DW_AT_LOW_PC, 0),
            Attr::addr(dwarf::DW_AT_HIGH_PC, i64::from(text_length)),
            Attr::string(dwarf::DW_AT_NAME, first_file, false),
            Attr::string(dwarf::DW_AT_COMP_DIR, debug.comp_dir.clone(), false),
            Attr::string(dwarf::DW_AT_PRODUCER, PRODUCER, false),
            Attr::constant(
                dwarf::DW_AT_LANGUAGE,
                i64::from(dwarf::DW_LANG_MIPS_ASSEMBLER),
                2,
            ),
        ],
        children: Vec::new(),
    };
    let info = write_info(&[compile_unit], endian);
    builder.add_section(dwarf_section(b".debug_info", info.info));
    builder.add_section(info.relocations.to_section(b".debug_info", &symbol_map, endian));
    builder.add_section(dwarf_section(b".debug_abbrev", info.abbrev));

    let mut strings = dwarf_section(b".debug_str", info.strings.into_data());
    strings.sh_entsize = 1;
    builder.add_section(strings);

    Ok(())
}

/// Assemble the output object in memory.
///
/// The section order is fixed: the null section, `.text`, `.data`, then
/// (with debug input) the DWARF sections interleaved with their `.rel`
/// companions. The serializer appends the symbol and string tables.
pub fn build_object(
    text: Vec<u8>,
    data: Vec<u8>,
    link_name: &str,
    debug: Option<&DebugInput>,
) -> Result<Builder> {
    let text_length = text.len() as u32;
    let data_length = data.len() as u32;

    let mut builder = Builder::new(Endianness::Big);
    builder.header.e_type = elf::ET_REL;
    builder.header.e_machine = elf::EM_MIPS;
    builder.header.e_entry = 0;
    builder.header.e_flags = RSP_E_FLAGS;

    builder.add_section(Section::new(&b""[..], elf::SHT_NULL));

    let mut text_section = Section::new(&b".text"[..], elf::SHT_PROGBITS);
    text_section.sh_flags = elf::SHF_ALLOC | elf::SHF_EXECINSTR;
    text_section.sh_addralign = 16;
    text_section.data = text;
    builder.add_section(text_section);

    let mut data_section = Section::new(&b".data"[..], elf::SHT_PROGBITS);
    data_section.sh_flags = elf::SHF_WRITE | elf::SHF_ALLOC;
    data_section.sh_addralign = 16;
    data_section.data = data;
    builder.add_section(data_section);

    if let Some(debug) = debug {
        append_debug_sections(&mut builder, debug, text_length)?;
    }

    builder.add_symbol(Symbol {
        name: Vec::new(),
        st_value: 0,
        st_size: 0,
        st_bind: elf::STB_LOCAL,
        st_type: elf::STT_NOTYPE,
        st_other: 0,
        st_shndx: 0,
    });
    for (name, shndx) in [(&b".text"[..], 1), (&b".data"[..], 2)] {
        builder.add_symbol(Symbol {
            name: name.to_vec(),
            st_value: 0,
            st_size: 0,
            st_bind: elf::STB_LOCAL,
            st_type: elf::STT_SECTION,
            st_other: 0,
            st_shndx: shndx,
        });
    }
    builder.add_symbol(global_symbol(
        format!("{}TextStart", link_name),
        elf::STT_FUNC,
        0,
        text_length,
        1,
    ));
    builder.add_symbol(global_symbol(
        format!("{}TextEnd", link_name),
        elf::STT_FUNC,
        text_length,
        0,
        1,
    ));
    builder.add_symbol(global_symbol(
        format!("{}DataStart", link_name),
        elf::STT_OBJECT,
        0,
        data_length,
        2,
    ));
    builder.add_symbol(global_symbol(
        format!("{}DataEnd", link_name),
        elf::STT_OBJECT,
        data_length,
        0,
        2,
    ));

    if let Some(debug) = debug {
        for symbol in &debug.instruction_symbols {
            builder.add_symbol(global_symbol(
                symbol.name.clone(),
                elf::STT_FUNC,
                symbol.value,
                symbol.size,
                1,
            ));
        }
        for symbol in &debug.data_symbols {
            builder.add_symbol(global_symbol(
                symbol.name.clone(),
                elf::STT_OBJECT,
                symbol.value,
                symbol.size,
                2,
            ));
        }
    }

    debug!(
        "{} text bytes, {} data bytes, {} symbols, {} sections before the symbol tables",
        text_length,
        data_length,
        builder.symbols.len(),
        builder.sections.len()
    );

    Ok(builder)
}

/// Append `suffix` to the file name of `path`.
fn input_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|error| {
        if error.kind() == io::ErrorKind::NotFound {
            Error::not_found(path.to_string_lossy())
        } else {
            Error::from(error)
        }
    })
}

fn read_input_string(path: &Path) -> Result<String> {
    let data = read_input(path)?;
    String::from_utf8(data)
        .map_err(|_| Error::malformed(format!("'{}' is not valid UTF-8", path.display())))
}

/// Convert `input` into an object file written at `output`.
pub fn convert(input: &Path, output: &Path, link_name: &str, include_debug: bool) -> Result<()> {
    let text = read_input(input)?;
    let data = read_input(&input_with_suffix(input, ".dat"))?;

    let debug = if include_debug {
        let sym = read_input_string(&input_with_suffix(input, ".sym"))?;
        let rows = symfile::parse_sym_file(&sym)?;
        debug!("{} line rows", rows.len());

        let dbg = read_input_string(&input_with_suffix(input, ".dbg"))?;
        let (instruction_symbols, data_symbols) =
            symfile::parse_dbg_file(&dbg, text.len() as u32, data.len() as u32)?;
        debug!(
            "{} instruction symbols, {} data symbols",
            instruction_symbols.len(),
            data_symbols.len()
        );

        let comp_dir = env::current_dir()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("/"));

        Some(DebugInput {
            rows,
            instruction_symbols,
            data_symbols,
            comp_dir,
        })
    } else {
        None
    };

    let builder = build_object(text, data, link_name, debug.as_ref())?;

    let mut buffer = Vec::new();
    builder.write(&mut buffer).map_err(Error::from)?;
    fs::write(output, &buffer)?;
    debug!("wrote {} bytes to '{}'", buffer.len(), output.display());

    Ok(())
}
