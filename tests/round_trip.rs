use std::collections::HashMap;

use rspobj::endian::Endianness;
use rspobj::write::dwarf::{write_aranges, write_line_program, LineRow};
use rspobj::write::elf::{Builder, Relocations, Section, Symbol};
use rspobj::{elf, read};

fn symbol(name: &[u8], st_bind: u8, st_type: u8, value: u32, size: u32, shndx: u16) -> Symbol {
    Symbol {
        name: name.to_vec(),
        st_value: value,
        st_size: size,
        st_bind,
        st_type,
        st_other: 0,
        st_shndx: shndx,
    }
}

fn base_builder(text: &[u8], data: &[u8]) -> Builder {
    let mut builder = Builder::new(Endianness::Big);
    builder.header.e_type = elf::ET_REL;
    builder.header.e_machine = elf::EM_MIPS;
    builder.header.e_flags = 0x20000101;

    builder.add_section(Section::new(&b""[..], elf::SHT_NULL));

    let mut text_section = Section::new(&b".text"[..], elf::SHT_PROGBITS);
    text_section.sh_flags = elf::SHF_ALLOC | elf::SHF_EXECINSTR;
    text_section.sh_addralign = 16;
    text_section.data = text.to_vec();
    builder.add_section(text_section);

    let mut data_section = Section::new(&b".data"[..], elf::SHT_PROGBITS);
    data_section.sh_flags = elf::SHF_WRITE | elf::SHF_ALLOC;
    data_section.sh_addralign = 16;
    data_section.data = data.to_vec();
    builder.add_section(data_section);

    builder
}

fn add_base_symbols(builder: &mut Builder, text_len: u32, data_len: u32) {
    builder.add_symbol(symbol(b"", elf::STB_LOCAL, elf::STT_NOTYPE, 0, 0, 0));
    builder.add_symbol(symbol(b".text", elf::STB_LOCAL, elf::STT_SECTION, 0, 0, 1));
    builder.add_symbol(symbol(b".data", elf::STB_LOCAL, elf::STT_SECTION, 0, 0, 2));
    builder.add_symbol(symbol(
        b"testTextStart",
        elf::STB_GLOBAL,
        elf::STT_FUNC,
        0,
        text_len,
        1,
    ));
    builder.add_symbol(symbol(
        b"testTextEnd",
        elf::STB_GLOBAL,
        elf::STT_FUNC,
        text_len,
        0,
        1,
    ));
    builder.add_symbol(symbol(
        b"testDataStart",
        elf::STB_GLOBAL,
        elf::STT_OBJECT,
        0,
        data_len,
        2,
    ));
    builder.add_symbol(symbol(
        b"testDataEnd",
        elf::STB_GLOBAL,
        elf::STT_OBJECT,
        data_len,
        0,
        2,
    ));
}

#[test]
fn minimal_object() {
    let mut builder = base_builder(&[0, 0, 0, 0], &[]);
    add_base_symbols(&mut builder, 4, 0);

    let mut buffer = Vec::new();
    builder.write(&mut buffer).unwrap();

    let file = read::File::parse(&buffer).unwrap();
    assert_eq!(file.endian, Endianness::Big);
    assert_eq!(file.e_type, elf::ET_REL);
    assert_eq!(file.e_machine, elf::EM_MIPS);
    assert_eq!(file.e_flags, 0x20000101);
    assert_eq!(file.e_entry, 0);

    let names: Vec<&[u8]> = file.sections.iter().map(|s| &s.name[..]).collect();
    assert_eq!(
        names,
        [
            &b""[..],
            b".text",
            b".data",
            b".symtab",
            b".strtab",
            b".shstrtab",
        ]
    );

    let text = file.section_by_name(b".text").unwrap();
    assert_eq!(text.data, [0, 0, 0, 0]);
    assert_eq!(text.sh_flags, elf::SHF_ALLOC | elf::SHF_EXECINSTR);

    let symbols = file.symbols().unwrap();
    assert_eq!(symbols.len(), 7);
    assert_eq!(symbols[0].name, b"");
    assert_eq!(symbols[3].name, b"testTextStart");
    assert_eq!(symbols[3].st_size, 4);
    assert_eq!(symbols[4].st_value, 4);
    assert_eq!(symbols[6].st_shndx, 2);
}

#[test]
fn section_offsets_are_aligned() {
    let mut builder = base_builder(&[0x12; 20], &[0x34; 7]);
    add_base_symbols(&mut builder, 20, 7);

    let mut buffer = Vec::new();
    builder.write(&mut buffer).unwrap();

    let file = read::File::parse(&buffer).unwrap();
    for section in &file.sections {
        if section.sh_type == elf::SHT_NULL || section.sh_addralign == 0 {
            continue;
        }
        assert_eq!(
            section.sh_offset % section.sh_addralign,
            0,
            "section {:?} is misaligned",
            String::from_utf8_lossy(&section.name)
        );
    }

    // Section data survives the padding.
    assert_eq!(file.section_by_name(b".text").unwrap().data, [0x12; 20]);
    assert_eq!(file.section_by_name(b".data").unwrap().data, [0x34; 7]);
}

#[test]
fn symtab_marks_last_local() {
    let mut builder = base_builder(&[0; 4], &[]);
    add_base_symbols(&mut builder, 4, 0);

    let mut buffer = Vec::new();
    builder.write(&mut buffer).unwrap();

    let file = read::File::parse(&buffer).unwrap();
    let symtab = file.section_by_name(b".symtab").unwrap();
    let symbols = file.symbols().unwrap();

    let last_local = symbols
        .iter()
        .rposition(|symbol| symbol.st_bind == elf::STB_LOCAL)
        .unwrap();
    assert_eq!(symtab.sh_info, last_local as u32 + 1);
    assert_eq!(symtab.sh_info, 3);

    // The symbol table links to .strtab.
    let strtab_index = symtab.sh_link as usize;
    assert_eq!(file.sections[strtab_index].name, b".strtab");
}

#[test]
fn relocation_section_round_trip() {
    let mut builder = base_builder(&[0; 8], &[]);

    let mut relocations = Relocations::new();
    relocations.add(16, &b".text"[..], elf::R_MIPS_32);
    relocations.add(20, &b".text"[..], elf::R_MIPS_32);
    let map = HashMap::from([(b".text".to_vec(), 1u32), (b".data".to_vec(), 2u32)]);
    builder.add_section(relocations.to_section(b".debug_aranges", &map, Endianness::Big));

    add_base_symbols(&mut builder, 8, 0);

    let mut buffer = Vec::new();
    builder.write(&mut buffer).unwrap();

    let file = read::File::parse(&buffer).unwrap();
    let decoded = file.relocations(b".rel.debug_aranges").unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].r_offset, 16);
    assert_eq!(decoded[1].r_offset, 20);
    for relocation in &decoded {
        assert_eq!(relocation.r_sym, 1);
        assert_eq!(relocation.r_type, elf::R_MIPS_32);
    }
}

#[test]
fn debug_sections_round_trip() {
    let text = [0u8; 8];
    let mut builder = base_builder(&text, &[]);

    let map = HashMap::from([(b".text".to_vec(), 1u32), (b".data".to_vec(), 2u32)]);

    let rows = vec![
        LineRow {
            address: 0,
            file: String::from("hello.s"),
            line: 3,
            column: 0,
            is_stmt: true,
            basic_block: false,
        },
        LineRow {
            address: 4,
            file: String::from("hello.s"),
            line: 4,
            column: 0,
            is_stmt: true,
            basic_block: false,
        },
    ];
    let (line_data, line_relocations) =
        write_line_program(&rows, Endianness::Big).unwrap();
    let mut line_section = Section::new(&b".debug_line"[..], elf::SHT_MIPS_DWARF);
    line_section.sh_addralign = 1;
    line_section.data = line_data;
    builder.add_section(line_section);
    builder.add_section(line_relocations.to_section(b".debug_line", &map, Endianness::Big));

    let (aranges_data, aranges_relocations) = write_aranges(text.len() as u32, Endianness::Big);
    let mut aranges_section = Section::new(&b".debug_aranges"[..], elf::SHT_MIPS_DWARF);
    aranges_section.sh_addralign = 1;
    aranges_section.data = aranges_data;
    builder.add_section(aranges_section);
    builder.add_section(aranges_relocations.to_section(b".debug_aranges", &map, Endianness::Big));

    add_base_symbols(&mut builder, text.len() as u32, 0);

    let mut buffer = Vec::new();
    builder.write(&mut buffer).unwrap();

    let file = read::File::parse(&buffer).unwrap();

    let line = file.section_by_name(b".debug_line").unwrap();
    assert_eq!(line.sh_type, elf::SHT_MIPS_DWARF);
    // unit length >= 20 and version 2.
    let unit_length = u32::from_be_bytes(line.data[0..4].try_into().unwrap());
    assert!(unit_length >= 20);
    assert_eq!(&line.data[4..6], &[0, 2]);

    let line_relocations = file.relocations(b".rel.debug_line").unwrap();
    assert_eq!(line_relocations.len(), 1);
    assert_eq!(line_relocations[0].r_sym, 1);
    assert_eq!(line_relocations[0].r_type, elf::R_MIPS_32);
    // The relocated word is the zeroed set_address operand.
    let offset = line_relocations[0].r_offset as usize;
    assert_eq!(&line.data[offset - 3..offset], &[0, 5, 2]);
    assert_eq!(&line.data[offset..offset + 4], &[0; 4]);

    let aranges = file.section_by_name(b".debug_aranges").unwrap();
    assert_eq!(aranges.data.len(), 32);
    assert_eq!(
        u32::from_be_bytes(aranges.data[20..24].try_into().unwrap()),
        8
    );
}

#[test]
fn little_endian_serialization() {
    let mut builder = base_builder(&[1, 2, 3, 4], &[]);
    builder.endian = Endianness::Little;
    add_base_symbols(&mut builder, 4, 0);

    let mut buffer = Vec::new();
    builder.write(&mut buffer).unwrap();
    assert_eq!(buffer[5], 1); // ELFDATA2LSB

    let file = read::File::parse(&buffer).unwrap();
    assert_eq!(file.endian, Endianness::Little);
    assert_eq!(file.e_machine, elf::EM_MIPS);
    assert_eq!(file.section_by_name(b".text").unwrap().data, [1, 2, 3, 4]);
    assert_eq!(file.symbols().unwrap().len(), 7);
}
