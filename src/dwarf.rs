//! DWARF version 2 definitions.
//!
//! Constants for the subset of DWARF emitted into RSP objects: entry tags,
//! attributes, attribute forms, the line number program opcodes, and the
//! vendor language code used for MIPS assembly.

// Entry tags, written as the second field of an abbreviation declaration.
/// `DW_TAG_array_type`
pub const DW_TAG_ARRAY_TYPE: u16 = 0x01;
/// `DW_TAG_entry_point`
pub const DW_TAG_ENTRY_POINT: u16 = 0x03;
/// `DW_TAG_label`
pub const DW_TAG_LABEL: u16 = 0x0a;
/// `DW_TAG_lexical_block`
pub const DW_TAG_LEXICAL_BLOCK: u16 = 0x0b;
/// `DW_TAG_compile_unit`
pub const DW_TAG_COMPILE_UNIT: u16 = 0x11;
/// `DW_TAG_subprogram`
pub const DW_TAG_SUBPROGRAM: u16 = 0x2e;
/// `DW_TAG_variable`
pub const DW_TAG_VARIABLE: u16 = 0x34;

// Attribute names.
/// `DW_AT_sibling`
pub const DW_AT_SIBLING: u16 = 0x01;
/// `DW_AT_location`
pub const DW_AT_LOCATION: u16 = 0x02;
/// `DW_AT_name`
pub const DW_AT_NAME: u16 = 0x03;
/// `DW_AT_byte_size`
pub const DW_AT_BYTE_SIZE: u16 = 0x0b;
/// `DW_AT_stmt_list`
pub const DW_AT_STMT_LIST: u16 = 0x10;
/// `DW_AT_low_pc`
pub const DW_AT_LOW_PC: u16 = 0x11;
/// `DW_AT_high_pc`
pub const DW_AT_HIGH_PC: u16 = 0x12;
/// `DW_AT_language`
pub const DW_AT_LANGUAGE: u16 = 0x13;
/// `DW_AT_comp_dir`
pub const DW_AT_COMP_DIR: u16 = 0x1b;
/// `DW_AT_producer`
pub const DW_AT_PRODUCER: u16 = 0x25;
/// `DW_AT_external`
pub const DW_AT_EXTERNAL: u16 = 0x3f;

// Attribute forms.
/// `DW_FORM_addr`: a relocatable machine address.
pub const DW_FORM_ADDR: u16 = 0x01;
/// `DW_FORM_block2`: a block with a 2 byte length prefix.
pub const DW_FORM_BLOCK2: u16 = 0x03;
/// `DW_FORM_block4`: a block with a 4 byte length prefix.
pub const DW_FORM_BLOCK4: u16 = 0x04;
/// `DW_FORM_data2`: a 2 byte constant.
pub const DW_FORM_DATA2: u16 = 0x05;
/// `DW_FORM_data4`: a 4 byte constant.
pub const DW_FORM_DATA4: u16 = 0x06;
/// `DW_FORM_data8`: an 8 byte constant.
pub const DW_FORM_DATA8: u16 = 0x07;
/// `DW_FORM_string`: an inline nul-terminated string.
pub const DW_FORM_STRING: u16 = 0x08;
/// `DW_FORM_block`: a block with a ULEB128 length prefix.
pub const DW_FORM_BLOCK: u16 = 0x09;
/// `DW_FORM_block1`: a block with a 1 byte length prefix.
pub const DW_FORM_BLOCK1: u16 = 0x0a;
/// `DW_FORM_data1`: a 1 byte constant.
pub const DW_FORM_DATA1: u16 = 0x0b;
/// `DW_FORM_flag`: a 1 byte flag.
pub const DW_FORM_FLAG: u16 = 0x0c;
/// `DW_FORM_sdata`: an SLEB128 constant.
pub const DW_FORM_SDATA: u16 = 0x0d;
/// `DW_FORM_strp`: a 4 byte offset into `.debug_str`.
pub const DW_FORM_STRP: u16 = 0x0e;
/// `DW_FORM_udata`: a ULEB128 constant.
pub const DW_FORM_UDATA: u16 = 0x0f;
/// `DW_FORM_indirect`: the form is stored with the value.
pub const DW_FORM_INDIRECT: u16 = 0x16;

// Line number program standard opcodes.
/// Append a row to the matrix.
pub const DW_LNS_COPY: u8 = 1;
/// Advance the address by a ULEB128 operand scaled by the instruction length.
pub const DW_LNS_ADVANCE_PC: u8 = 2;
/// Advance the line by an SLEB128 operand.
pub const DW_LNS_ADVANCE_LINE: u8 = 3;
/// Set the file register.
pub const DW_LNS_SET_FILE: u8 = 4;
/// Set the column register.
pub const DW_LNS_SET_COLUMN: u8 = 5;
/// Toggle the is_stmt register.
pub const DW_LNS_NEGATE_STMT: u8 = 6;
/// Set the basic_block register.
pub const DW_LNS_SET_BASIC_BLOCK: u8 = 7;
/// Advance the address as if by special opcode 255.
pub const DW_LNS_CONST_ADD_PC: u8 = 8;
/// Advance the address by a fixed 2 byte operand.
pub const DW_LNS_FIXED_ADVANCE_PC: u8 = 9;

// Line number program extended opcodes.
/// End a sequence of rows.
pub const DW_LNE_END_SEQUENCE: u8 = 1;
/// Set the address register to a relocatable address.
pub const DW_LNE_SET_ADDRESS: u8 = 2;
/// Define a file not listed in the prologue.
pub const DW_LNE_DEFINE_FILE: u8 = 3;

/// Vendor language code used by rspasm for MIPS assembly sources.
pub const DW_LANG_MIPS_ASSEMBLER: u16 = 0x8001;
