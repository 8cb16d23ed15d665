//! Writing the `.debug_line` line number program.
//!
//! The encoder runs the DWARF v2 line number state machine in reverse:
//! given the desired rows of the line table, it chooses the shortest opcode
//! sequence that makes the consumer's state machine reproduce them, using
//! "special opcodes" that combine a line advance, an address advance, and
//! the row append in a single byte whenever the deltas fit.

use crate::dwarf;
use crate::elf;
use crate::endian::{Endianness, U16, U32};
use crate::leb128::{write_sleb128, write_uleb128};
use crate::write::elf::Relocations;
use crate::write::{Error, Result, WritableBuffer};

// Prologue parameters. RSP instructions are fixed 4-byte words, so address
// advances are always exact multiples of the instruction length, and a
// line_base of zero favors the common forward-only line flow of assembly
// listings.
const LINE_BASE: i64 = 0;
const LINE_RANGE: i64 = 16;
const OPCODE_BASE: i64 = 10;
const MIN_INSTRUCTION_LENGTH: u32 = 4;
const STANDARD_OPCODE_LENGTHS: [u8; 9] = [0, 1, 1, 1, 1, 0, 0, 0, 1];

/// One row of the line number matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow {
    /// Byte offset of the instruction from the start of `.text`.
    /// Must be a multiple of 4.
    pub address: u32,
    /// Name of the source file.
    pub file: String,
    /// Source line number.
    pub line: u32,
    /// Source column number, or 0 when unknown.
    pub column: u32,
    /// Whether the row is a recommended breakpoint location.
    pub is_stmt: bool,
    /// Whether the instruction begins a basic block.
    pub basic_block: bool,
}

/// Sort rows by address and drop consecutive rows that repeat the same
/// source position, keeping the first of each run.
fn sort_and_filter(rows: &[LineRow]) -> Vec<LineRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|row| row.address);
    sorted.dedup_by(|next, kept| {
        next.line == kept.line && next.column == kept.column && next.file == kept.file
    });
    sorted
}

/// Return the 1-based prologue index of `name`, or 0 if it is not listed.
fn find_file(files: &[&str], name: &str) -> u64 {
    files
        .iter()
        .position(|file| *file == name)
        .map_or(0, |index| index as u64 + 1)
}

/// Return the single byte encoding both deltas, if one exists.
fn special_opcode(line_delta: i64, addr_delta: u32) -> Option<u8> {
    if !(LINE_BASE..LINE_BASE + LINE_RANGE).contains(&line_delta) {
        return None;
    }
    let op = (line_delta - LINE_BASE)
        + LINE_RANGE * i64::from(addr_delta / MIN_INSTRUCTION_LENGTH)
        + OPCODE_BASE;
    if (OPCODE_BASE..256).contains(&op) {
        Some(op as u8)
    } else {
        None
    }
}

fn write_opcodes(
    rows: &[LineRow],
    files: &[&str],
    default_is_stmt: bool,
    relocations: &mut Relocations,
) -> Vec<u8> {
    let mut result = Vec::new();

    let mut address: u32 = 0;
    let mut file: u64 = 1;
    let mut line: i64 = 1;
    let mut column: u32 = 0;
    let mut is_stmt = default_is_stmt;
    let mut basic_block = false;

    // Open with set_address. The operand stays zero; the recorded relocation
    // makes the linker fill in the final `.text` address.
    result.push(0);
    result.push(5);
    result.push(dwarf::DW_LNE_SET_ADDRESS);
    relocations.add(result.len() as u32, &b".text"[..], elf::R_MIPS_32);
    result.extend_from_slice(&[0; 4]);

    for row in rows {
        let row_file = find_file(files, &row.file);
        if row_file != file {
            result.push(dwarf::DW_LNS_SET_FILE);
            write_uleb128(&mut result, row_file);
            file = row_file;
        }

        if column != row.column {
            result.push(dwarf::DW_LNS_SET_COLUMN);
            write_uleb128(&mut result, u64::from(row.column));
            column = row.column;
        }

        if row.basic_block && !basic_block {
            result.push(dwarf::DW_LNS_SET_BASIC_BLOCK);
            basic_block = true;
        }

        if row.is_stmt != is_stmt {
            result.push(dwarf::DW_LNS_NEGATE_STMT);
            is_stmt = !is_stmt;
        }

        let line_delta = i64::from(row.line) - line;
        let addr_delta = row.address - address;

        if let Some(op) = special_opcode(line_delta, addr_delta) {
            result.push(op);
            line = i64::from(row.line);
            address = row.address;
        } else {
            if addr_delta != 0 {
                result.push(dwarf::DW_LNS_ADVANCE_PC);
                write_uleb128(&mut result, u64::from(addr_delta / MIN_INSTRUCTION_LENGTH));
                address = row.address;
            }
            if line_delta != 0 {
                result.push(dwarf::DW_LNS_ADVANCE_LINE);
                write_sleb128(&mut result, line_delta);
                line = i64::from(row.line);
            }
            result.push(dwarf::DW_LNS_COPY);
        }
    }

    result.push(0);
    result.push(1);
    result.push(dwarf::DW_LNE_END_SEQUENCE);

    result
}

/// Emit a `.debug_line` section for the given rows.
///
/// Rows may arrive in any order; they are sorted by address, and runs of
/// rows repeating the same `(line, column, file)` collapse to their first
/// entry. Returns the section contents and one relocation binding the
/// `DW_LNE_set_address` operand to `.text`.
///
/// At least one row is required, and every address must be a multiple of
/// the 4-byte instruction length.
pub fn write_line_program(rows: &[LineRow], endian: Endianness) -> Result<(Vec<u8>, Relocations)> {
    let sorted = sort_and_filter(rows);
    let first = sorted
        .first()
        .ok_or_else(|| Error(String::from("Line program requires at least one row")))?;
    if let Some(row) = sorted
        .iter()
        .find(|row| row.address % MIN_INSTRUCTION_LENGTH != 0)
    {
        return Err(Error(format!(
            "Line row address {:#x} is not a multiple of the instruction length",
            row.address
        )));
    }
    let default_is_stmt = first.is_stmt;

    // Collect the file table in order of first appearance.
    let mut files: Vec<&str> = Vec::new();
    for row in &sorted {
        if find_file(&files, &row.file) == 0 {
            files.push(&row.file);
        }
    }

    let mut relocations = Relocations::new();
    let opcodes = write_opcodes(&sorted, &files, default_is_stmt, &mut relocations);

    let file_name_bytes: usize = files.iter().map(|file| file.len()).sum();
    let prologue_length =
        (7 + STANDARD_OPCODE_LENGTHS.len() + file_name_bytes + 4 * files.len()) as u32;
    let total_length = opcodes.len() as u32 + prologue_length + 6;

    let mut result = Vec::new();
    result.write_pod(&U32::new(endian, total_length));
    result.write_pod(&U16::new(endian, 2));
    result.write_pod(&U32::new(endian, prologue_length));
    result.push(MIN_INSTRUCTION_LENGTH as u8);
    result.push(u8::from(default_is_stmt));
    result.push(LINE_BASE as u8);
    result.push(LINE_RANGE as u8);
    result.push(OPCODE_BASE as u8);
    result.extend_from_slice(&STANDARD_OPCODE_LENGTHS);

    result.push(0); // no include directories

    for file in &files {
        result.extend_from_slice(file.as_bytes());
        result.push(0); // name terminator
        result.push(0); // directory index
        result.push(0); // last modification
        result.push(0); // size
    }
    result.push(0); // end of the file table

    // The set_address operand was recorded relative to the opcode stream;
    // express it relative to the section start now that the prologue length
    // is final.
    relocations.shift(result.len() as u32);
    result.extend_from_slice(&opcodes);

    Ok((result, relocations))
}
