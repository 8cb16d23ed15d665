//! Writing ELF32 relocatable objects.
//!
//! [`Builder`] owns the ordered section list and the symbol list, and
//! serializes them with [`Builder::write`]. Writing is a two phase process:
//! the first phase derives everything whose value must be known ahead of time
//! (the symbol and string tables, section name offsets, and the file layout),
//! and the second phase writes the file strictly front to back. The section
//! order chosen by the caller determines both section indices and layout
//! order; symbol insertion order determines symbol indices.

use std::collections::HashMap;
use std::mem;

use crate::elf;
use crate::endian::{Endian, Endianness, U16, U32};
use crate::write::string::StringTable;
use crate::write::{align, write_align, Error, Result, WritableBuffer};

/// Native endian fields of the ELF file header that the caller chooses.
///
/// The remaining header fields are derived during serialization.
#[derive(Debug, Default, Clone)]
pub struct FileHeader {
    /// Object file type. One of the `ET_*` constants.
    pub e_type: u16,
    /// Architecture. One of the `EM_*` constants.
    pub e_machine: u16,
    /// Entry point virtual address.
    pub e_entry: u32,
    /// Processor-specific flags.
    pub e_flags: u32,
}

/// A section of the file under construction.
///
/// The file offset, size, and name offset are derived during serialization;
/// everything else is supplied by the caller.
#[derive(Debug, Clone)]
pub struct Section {
    /// Section name.
    pub name: Vec<u8>,
    /// Section type. One of the `SHT_*` constants.
    pub sh_type: u32,
    /// Section flags. A combination of the `SHF_*` constants.
    pub sh_flags: u32,
    /// Section virtual address at execution.
    pub sh_addr: u32,
    /// Link to another section.
    pub sh_link: u32,
    /// Additional section information.
    pub sh_info: u32,
    /// Section alignment. Zero means no alignment constraint.
    pub sh_addralign: u32,
    /// Entry size if the section holds a table.
    pub sh_entsize: u32,
    /// Section contents.
    pub data: Vec<u8>,
}

impl Section {
    /// Create a section with the given name and type.
    ///
    /// All other fields start at zero and the section is empty.
    pub fn new(name: impl Into<Vec<u8>>, sh_type: u32) -> Self {
        Section {
            name: name.into(),
            sh_type,
            sh_flags: 0,
            sh_addr: 0,
            sh_link: 0,
            sh_info: 0,
            sh_addralign: 0,
            sh_entsize: 0,
            data: Vec::new(),
        }
    }
}

/// A symbol table entry under construction.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Symbol name.
    pub name: Vec<u8>,
    /// Symbol value.
    pub st_value: u32,
    /// Symbol size.
    pub st_size: u32,
    /// Symbol binding. One of the `STB_*` constants.
    pub st_bind: u8,
    /// Symbol type. One of the `STT_*` constants.
    pub st_type: u8,
    /// Symbol visibility.
    pub st_other: u8,
    /// Index of the section the symbol is defined in.
    pub st_shndx: u16,
}

/// A single pending relocation.
#[derive(Debug, Clone)]
pub struct Relocation {
    /// Byte offset of the patched field within the target section.
    pub r_offset: u32,
    /// Name of the symbol the relocation is computed against.
    pub symbol: Vec<u8>,
    /// Relocation type. One of the `R_MIPS_*` constants.
    pub r_type: u8,
}

/// An ordered list of relocations against one target section.
///
/// Offsets may be recorded before the target section's final prologue length
/// is known and corrected afterwards with [`shift`](Relocations::shift).
#[derive(Debug, Default, Clone)]
pub struct Relocations {
    entries: Vec<Relocation>,
}

impl Relocations {
    /// Create an empty list.
    pub fn new() -> Self {
        Relocations::default()
    }

    /// Append an entry.
    pub fn add(&mut self, r_offset: u32, symbol: impl Into<Vec<u8>>, r_type: u8) {
        self.entries.push(Relocation {
            r_offset,
            symbol: symbol.into(),
            r_type,
        });
    }

    /// Add `delta` to the offset of every recorded entry.
    pub fn shift(&mut self, delta: u32) {
        for entry in &mut self.entries {
            entry.r_offset += delta;
        }
    }

    /// Return the number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if no entries have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the recorded entries in insertion order.
    pub fn entries(&self) -> &[Relocation] {
        &self.entries
    }

    /// Serialize the entries into a `.rel<target>` section.
    ///
    /// Symbol names are resolved through `symbols`; a name that is missing
    /// from the map resolves to symbol index 0. Entries keep their insertion
    /// order.
    pub fn to_section(
        &self,
        target: &[u8],
        symbols: &HashMap<Vec<u8>, u32>,
        endian: Endianness,
    ) -> Section {
        let mut data = Vec::new();
        for entry in &self.entries {
            let r_sym = symbols.get(&entry.symbol).copied().unwrap_or(0);
            data.write_pod(&elf::Rel32 {
                r_offset: U32::new(endian, entry.r_offset),
                r_info: elf::Rel32::r_info(endian, r_sym, entry.r_type),
            });
        }

        let mut name = b".rel".to_vec();
        name.extend_from_slice(target);
        let mut section = Section::new(name, elf::SHT_REL);
        section.sh_addralign = 4;
        section.sh_entsize = 8;
        section.data = data;
        section
    }
}

/// A builder for an ELF32 object file.
#[derive(Debug)]
pub struct Builder {
    /// Byte order of the emitted file.
    pub endian: Endianness,
    /// Caller-chosen file header fields.
    pub header: FileHeader,
    /// The ordered section list. Index 0 is conventionally a null section.
    pub sections: Vec<Section>,
    /// The symbol table. Local symbols must precede the others.
    pub symbols: Vec<Symbol>,
}

impl Builder {
    /// Create an empty builder for the given byte order.
    pub fn new(endian: Endianness) -> Self {
        Builder {
            endian,
            header: FileHeader::default(),
            sections: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Append a section, returning its index.
    pub fn add_section(&mut self, section: Section) -> usize {
        self.sections.push(section);
        self.sections.len() - 1
    }

    /// Append a symbol table entry.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    /// Serialize the file into `buffer`.
    ///
    /// This appends a `.symtab` and `.strtab` built from the symbol list
    /// (when any symbols were added) and a `.shstrtab`, lays out all section
    /// data with the required alignment padding, and writes the file header,
    /// section contents, and section header table.
    pub fn write(&self, buffer: &mut dyn WritableBuffer) -> Result<()> {
        let endian = self.endian;

        // Derive the symbol table and its string table.
        let mut derived = Vec::new();
        if !self.symbols.is_empty() {
            let mut strtab = StringTable::new();
            let mut symtab_data = Vec::new();
            let mut last_local = None;
            for (index, symbol) in self.symbols.iter().enumerate() {
                let st_name = strtab.add(&symbol.name);
                symtab_data.write_pod(&elf::Sym32 {
                    st_name: U32::new(endian, st_name),
                    st_value: U32::new(endian, symbol.st_value),
                    st_size: U32::new(endian, symbol.st_size),
                    st_info: elf::Sym32::<Endianness>::st_info(symbol.st_bind, symbol.st_type),
                    st_other: symbol.st_other,
                    st_shndx: U16::new(endian, symbol.st_shndx),
                });
                if symbol.st_bind == elf::STB_LOCAL {
                    last_local = Some(index);
                }
            }

            let strtab_index = self.sections.len() as u32 + 1;
            let mut symtab = Section::new(&b".symtab"[..], elf::SHT_SYMTAB);
            symtab.sh_link = strtab_index;
            symtab.sh_info = last_local.map_or(0, |index| index as u32 + 1);
            symtab.sh_addralign = 4;
            symtab.sh_entsize = 0x10;
            symtab.data = symtab_data;
            derived.push(symtab);

            let mut strtab_section = Section::new(&b".strtab"[..], elf::SHT_STRTAB);
            strtab_section.sh_addralign = 1;
            strtab_section.sh_entsize = 1;
            strtab_section.data = strtab.into_data();
            derived.push(strtab_section);
        }

        // Derive the section header string table from every section name,
        // including its own.
        let shstrtab = StringTable::sorted(
            self.sections
                .iter()
                .chain(derived.iter())
                .map(|section| &section.name[..])
                .chain([&b".shstrtab"[..]]),
        );
        let mut shstrtab_section = Section::new(&b".shstrtab"[..], elf::SHT_STRTAB);
        shstrtab_section.sh_addralign = 1;
        shstrtab_section.sh_entsize = 1;
        shstrtab_section.data = shstrtab.data().to_vec();
        derived.push(shstrtab_section);

        let sections: Vec<&Section> = self.sections.iter().chain(derived.iter()).collect();
        let e_shnum = sections.len();
        let e_shstrndx = e_shnum - 1;

        // Lay out the section data, starting directly after the file header.
        #[derive(Default, Clone, Copy)]
        struct SectionOffsets {
            sh_name: u32,
            sh_offset: usize,
            sh_size: usize,
        }
        let mut offsets = vec![SectionOffsets::default(); e_shnum];
        let mut offset = mem::size_of::<elf::FileHeader32<Endianness>>();
        for (index, section) in sections.iter().enumerate() {
            offsets[index].sh_name = shstrtab.get(&section.name).unwrap_or(0);
            if section.sh_type == elf::SHT_NULL {
                continue;
            }
            if section.sh_addralign != 0 {
                offset = align(offset, section.sh_addralign as usize);
            }
            offsets[index].sh_offset = offset;
            offsets[index].sh_size = section.data.len();
            offset += section.data.len();
        }
        let e_shoff = offset;

        // Write everything front to back.
        let header_size = mem::size_of::<elf::SectionHeader32<Endianness>>();
        buffer
            .reserve(e_shoff + e_shnum * header_size)
            .map_err(|_| Error(String::from("Cannot allocate buffer")))?;

        buffer.write(&elf::FileHeader32 {
            e_ident: elf::Ident {
                magic: elf::ELFMAG,
                class: elf::ELFCLASS32,
                data: if endian.is_little_endian() {
                    elf::ELFDATA2LSB
                } else {
                    elf::ELFDATA2MSB
                },
                version: elf::EV_CURRENT,
                os_abi: 0,
                abi_version: 0,
                padding: [0; 7],
            },
            e_type: U16::new(endian, self.header.e_type),
            e_machine: U16::new(endian, self.header.e_machine),
            e_version: U32::new(endian, u32::from(elf::EV_CURRENT)),
            e_entry: U32::new(endian, self.header.e_entry),
            e_phoff: U32::new(endian, 0),
            e_shoff: U32::new(endian, e_shoff as u32),
            e_flags: U32::new(endian, self.header.e_flags),
            e_ehsize: U16::new(endian, mem::size_of::<elf::FileHeader32<Endianness>>() as u16),
            e_phentsize: U16::new(endian, 0),
            e_phnum: U16::new(endian, 0),
            e_shentsize: U16::new(endian, header_size as u16),
            e_shnum: U16::new(endian, e_shnum as u16),
            e_shstrndx: U16::new(endian, e_shstrndx as u16),
        });

        for (index, section) in sections.iter().enumerate() {
            if section.sh_type == elf::SHT_NULL {
                continue;
            }
            if section.sh_addralign != 0 {
                write_align(buffer, section.sh_addralign as usize);
            }
            debug_assert_eq!(offsets[index].sh_offset, buffer.len());
            buffer.write_bytes(&section.data);
        }

        debug_assert_eq!(e_shoff, buffer.len());
        for (index, section) in sections.iter().enumerate() {
            buffer.write(&elf::SectionHeader32 {
                sh_name: U32::new(endian, offsets[index].sh_name),
                sh_type: U32::new(endian, section.sh_type),
                sh_flags: U32::new(endian, section.sh_flags),
                sh_addr: U32::new(endian, section.sh_addr),
                sh_offset: U32::new(endian, offsets[index].sh_offset as u32),
                sh_size: U32::new(endian, offsets[index].sh_size as u32),
                sh_link: U32::new(endian, section.sh_link),
                sh_info: U32::new(endian, section.sh_info),
                sh_addralign: U32::new(endian, section.sh_addralign),
                sh_entsize: U32::new(endian, section.sh_entsize),
            });
        }

        Ok(())
    }
}
