//! Parsers for the rspasm listing files.
//!
//! `rspasm` writes two line-oriented text files next to the assembled
//! microcode: `<input>.sym` maps instruction addresses to source positions,
//! and `<input>.dbg` lists the addresses of labels in the instruction and
//! data segments.

use std::collections::HashSet;

use rspobj::write::dwarf::LineRow;

use crate::error::{Error, Result};

/// A named address range in the instruction or data segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDef {
    /// Symbol name.
    pub name: String,
    /// Byte offset from the start of the segment.
    pub value: u32,
    /// Length of the range, assigned from the following symbol's address.
    pub size: u32,
}

/// Parse an address that is hexadecimal with a `0x` prefix, or decimal
/// without one.
fn parse_maybe_hex(input: &str) -> Result<u32> {
    let parsed = if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        input.parse()
    };
    parsed.map_err(|_| Error::parse_int(format!("Invalid address '{}'", input)))
}

/// Parse the contents of a `.sym` file into line table rows.
///
/// Each `line <address> <file> <line>` record becomes one row; all other
/// lines are ignored.
pub fn parse_sym_file(input: &str) -> Result<Vec<LineRow>> {
    let mut result = Vec::new();

    for line in input.lines() {
        let parts: Vec<&str> = line.trim_end_matches('\r').split(' ').collect();
        if parts.first() != Some(&"line") {
            continue;
        }
        if parts.len() < 4 {
            return Err(Error::malformed(format!(
                "Line record '{}' needs an address, a file name, and a line number",
                line
            )));
        }

        let address = parse_maybe_hex(parts[1])?;
        let line_number: u32 = parts[3]
            .parse()
            .map_err(|_| Error::parse_int(format!("Invalid line number '{}'", parts[3])))?;

        result.push(LineRow {
            address,
            file: parts[2].to_string(),
            line: line_number,
            column: 0,
            is_stmt: true,
            basic_block: false,
        });
    }

    Ok(result)
}

/// Sort symbols by address and derive each size from the distance to the
/// next symbol, with the last symbol reaching the end of the segment.
fn assign_ranges(mut symbols: Vec<SymbolDef>, segment_size: u32) -> Vec<SymbolDef> {
    symbols.sort_by_key(|symbol| symbol.value);
    for index in 1..symbols.len() {
        symbols[index - 1].size = symbols[index].value - symbols[index - 1].value;
    }
    if let Some(last) = symbols.last_mut() {
        last.size = segment_size.saturating_sub(last.value);
    }
    symbols
}

/// Parse the contents of a `.dbg` file.
///
/// Each line holds `name address kind` with a hexadecimal address and kind
/// `I` (instruction) or `D` (data); all other lines are ignored. An `I`
/// entry whose name also appears as a `D` entry is dropped. Returns the
/// instruction symbols and the data symbols, with sizes assigned from the
/// given segment sizes.
pub fn parse_dbg_file(
    input: &str,
    text_size: u32,
    data_size: u32,
) -> Result<(Vec<SymbolDef>, Vec<SymbolDef>)> {
    let mut instruction_symbols = Vec::new();
    let mut data_symbols: Vec<SymbolDef> = Vec::new();

    for line in input.lines() {
        let parts: Vec<&str> = line.trim_end_matches('\r').split(' ').collect();
        if parts.len() != 3 {
            continue;
        }

        let value = u32::from_str_radix(parts[1], 16)
            .map_err(|_| Error::parse_int(format!("Invalid symbol address '{}'", parts[1])))?;
        let symbol = SymbolDef {
            name: parts[0].to_string(),
            value,
            size: 0,
        };
        match parts[2] {
            "I" => instruction_symbols.push(symbol),
            "D" => data_symbols.push(symbol),
            _ => {}
        }
    }

    // Data labels shadow instruction labels of the same name.
    let data_names: HashSet<&str> = data_symbols.iter().map(|s| s.name.as_str()).collect();
    instruction_symbols.retain(|symbol| !data_names.contains(symbol.name.as_str()));

    Ok((
        assign_ranges(instruction_symbols, text_size),
        assign_ranges(data_symbols, data_size),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maybe_hex() {
        assert_eq!(parse_maybe_hex("0x40").unwrap(), 0x40);
        assert_eq!(parse_maybe_hex("0X10").unwrap(), 0x10);
        assert_eq!(parse_maybe_hex("64").unwrap(), 64);
        assert!(parse_maybe_hex("zzz").is_err());
        assert!(parse_maybe_hex("0xzz").is_err());
    }

    #[test]
    fn sym_file_rows() {
        let rows = parse_sym_file("line 0x00000000 hello.s 3\nignored\nline 0x4 hello.s 4\n")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].address, 0);
        assert_eq!(rows[0].file, "hello.s");
        assert_eq!(rows[0].line, 3);
        assert_eq!(rows[0].column, 0);
        assert!(rows[0].is_stmt);
        assert!(!rows[0].basic_block);
        assert_eq!(rows[1].address, 4);
    }

    #[test]
    fn sym_file_short_record() {
        assert!(parse_sym_file("line 0x0 hello.s\n").is_err());
    }

    #[test]
    fn sym_file_bad_number() {
        let err = parse_sym_file("line 0x0 hello.s abc\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ParseInt);
    }

    #[test]
    fn dbg_file_ranges() {
        let input = "start 0 I\nloop 8 I\nbuffer 10 D\n";
        let (instructions, data) = parse_dbg_file(input, 0x20, 0x40).unwrap();

        assert_eq!(
            instructions,
            [
                SymbolDef {
                    name: "start".to_string(),
                    value: 0,
                    size: 8,
                },
                SymbolDef {
                    name: "loop".to_string(),
                    value: 8,
                    size: 0x18,
                },
            ]
        );
        assert_eq!(
            data,
            [SymbolDef {
                name: "buffer".to_string(),
                value: 0x10,
                size: 0x30,
            }]
        );
    }

    #[test]
    fn dbg_file_data_shadows_instruction() {
        let input = "shared 0 I\nshared 4 D\nstart 8 I\n";
        let (instructions, data) = parse_dbg_file(input, 0x10, 0x10).unwrap();

        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].name, "start");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].name, "shared");
    }

    #[test]
    fn dbg_file_ignores_other_lines() {
        let (instructions, data) = parse_dbg_file("# comment\n\nword word\n", 4, 4).unwrap();
        assert!(instructions.is_empty());
        assert!(data.is_empty());
    }
}
