//! Reading ELF32 object files.
//!
//! A decoder for the class of files this crate writes: 32-bit relocatable
//! objects in either byte order. It resolves section names through the
//! section header string table and decodes the symbol and relocation
//! tables, which is what inspection and round-trip tests need.

use std::error;
use std::fmt;
use std::result;

use crate::elf;
use crate::endian::Endianness;
use crate::pod::from_bytes;

/// The error type used within the read module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error(&'static str);

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl error::Error for Error {}

/// The result type used within the read module.
pub type Result<T> = result::Result<T, Error>;

/// A decoded section.
#[derive(Debug, Clone)]
pub struct Section {
    /// Section name, resolved through the section header string table.
    pub name: Vec<u8>,
    /// Section type.
    pub sh_type: u32,
    /// Section flags.
    pub sh_flags: u32,
    /// Section virtual address.
    pub sh_addr: u32,
    /// Section file offset.
    pub sh_offset: u32,
    /// Section size in bytes.
    pub sh_size: u32,
    /// Link to another section.
    pub sh_link: u32,
    /// Additional section information.
    pub sh_info: u32,
    /// Section alignment.
    pub sh_addralign: u32,
    /// Entry size if the section holds a table.
    pub sh_entsize: u32,
    /// Section contents.
    pub data: Vec<u8>,
}

/// A decoded symbol table entry.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Symbol name, resolved through the linked string table.
    pub name: Vec<u8>,
    /// Symbol value.
    pub st_value: u32,
    /// Symbol size.
    pub st_size: u32,
    /// Symbol binding.
    pub st_bind: u8,
    /// Symbol type.
    pub st_type: u8,
    /// Symbol visibility.
    pub st_other: u8,
    /// Index of the section the symbol is defined in.
    pub st_shndx: u16,
}

/// A decoded relocation table entry.
#[derive(Debug, Clone, Copy)]
pub struct Relocation {
    /// Byte offset of the patched field within the target section.
    pub r_offset: u32,
    /// Index of the symbol the relocation is computed against.
    pub r_sym: u32,
    /// Relocation type.
    pub r_type: u8,
}

/// A decoded ELF32 object file.
#[derive(Debug)]
pub struct File {
    /// Byte order of the file.
    pub endian: Endianness,
    /// Object file type.
    pub e_type: u16,
    /// Architecture.
    pub e_machine: u16,
    /// Entry point virtual address.
    pub e_entry: u32,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// The sections, in header table order.
    pub sections: Vec<Section>,
}

/// Read a nul-terminated string out of a string table section.
///
/// Offset 0 and out of range offsets resolve to the empty string.
fn get_string(data: &[u8], offset: u32) -> Vec<u8> {
    let offset = offset as usize;
    if offset == 0 || offset >= data.len() {
        return Vec::new();
    }
    let tail = &data[offset..];
    let end = memchr::memchr(0, tail).unwrap_or(tail.len());
    tail[..end].to_vec()
}

impl File {
    /// Decode a file from its raw bytes.
    pub fn parse(data: &[u8]) -> Result<File> {
        let (header, _) = from_bytes::<elf::FileHeader32<Endianness>>(data)
            .ok_or(Error("File is too short for the ELF header"))?;

        let ident = &header.e_ident;
        if ident.magic != elf::ELFMAG {
            return Err(Error("Invalid ELF magic number"));
        }
        if ident.class != elf::ELFCLASS32 {
            return Err(Error("Only 32 bit files are supported"));
        }
        let endian = match ident.data {
            elf::ELFDATA2LSB => Endianness::Little,
            elf::ELFDATA2MSB => Endianness::Big,
            _ => return Err(Error("Unrecognized data encoding")),
        };
        if ident.version != elf::EV_CURRENT {
            return Err(Error("Only version 1 files are supported"));
        }

        let e_shoff = header.e_shoff.get(endian) as usize;
        let e_shnum = header.e_shnum.get(endian) as usize;
        let e_shstrndx = header.e_shstrndx.get(endian) as usize;

        let mut sections = Vec::with_capacity(e_shnum);
        let mut name_offsets = Vec::with_capacity(e_shnum);
        for index in 0..e_shnum {
            let offset = e_shoff + index * std::mem::size_of::<elf::SectionHeader32<Endianness>>();
            let bytes = data
                .get(offset..)
                .ok_or(Error("Section header out of range"))?;
            let (sh, _) = from_bytes::<elf::SectionHeader32<Endianness>>(bytes)
                .ok_or(Error("Section header out of range"))?;

            let sh_type = sh.sh_type.get(endian);
            let sh_offset = sh.sh_offset.get(endian);
            let sh_size = sh.sh_size.get(endian);
            let section_data = if sh_type == elf::SHT_NULL || sh_type == elf::SHT_NOBITS {
                Vec::new()
            } else {
                data.get(sh_offset as usize..(sh_offset as usize + sh_size as usize))
                    .ok_or(Error("Section data out of range"))?
                    .to_vec()
            };

            name_offsets.push(sh.sh_name.get(endian));
            sections.push(Section {
                name: Vec::new(),
                sh_type,
                sh_flags: sh.sh_flags.get(endian),
                sh_addr: sh.sh_addr.get(endian),
                sh_offset,
                sh_size,
                sh_link: sh.sh_link.get(endian),
                sh_info: sh.sh_info.get(endian),
                sh_addralign: sh.sh_addralign.get(endian),
                sh_entsize: sh.sh_entsize.get(endian),
                data: section_data,
            });
        }

        // Resolve names now that the section header string table is loaded.
        if e_shstrndx < sections.len() {
            let names = sections[e_shstrndx].data.clone();
            for (section, name_offset) in sections.iter_mut().zip(name_offsets) {
                section.name = get_string(&names, name_offset);
            }
        }

        Ok(File {
            endian,
            e_type: header.e_type.get(endian),
            e_machine: header.e_machine.get(endian),
            e_entry: header.e_entry.get(endian),
            e_flags: header.e_flags.get(endian),
            sections,
        })
    }

    /// Return the first section with the given name.
    pub fn section_by_name(&self, name: &[u8]) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Decode the symbol table.
    ///
    /// Symbol names are resolved through the string table named by the
    /// symbol table's `sh_link`.
    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        let symtab = match self
            .sections
            .iter()
            .find(|section| section.sh_type == elf::SHT_SYMTAB)
        {
            Some(section) => section,
            None => return Ok(Vec::new()),
        };
        let strings = self
            .sections
            .get(symtab.sh_link as usize)
            .map(|section| &section.data[..])
            .unwrap_or(&[]);

        let endian = self.endian;
        let mut symbols = Vec::new();
        let mut data = &symtab.data[..];
        while !data.is_empty() {
            let (sym, tail) =
                from_bytes::<elf::Sym32<Endianness>>(data).ok_or(Error("Invalid symbol table"))?;
            symbols.push(Symbol {
                name: get_string(strings, sym.st_name.get(endian)),
                st_value: sym.st_value.get(endian),
                st_size: sym.st_size.get(endian),
                st_bind: sym.st_info >> 4,
                st_type: sym.st_info & 0xf,
                st_other: sym.st_other,
                st_shndx: sym.st_shndx.get(endian),
            });
            data = tail;
        }
        Ok(symbols)
    }

    /// Decode a relocation section with the given name.
    pub fn relocations(&self, name: &[u8]) -> Result<Vec<Relocation>> {
        let section = self
            .section_by_name(name)
            .ok_or(Error("No such relocation section"))?;
        if section.sh_type != elf::SHT_REL {
            return Err(Error("Section is not a relocation table"));
        }

        let endian = self.endian;
        let mut relocations = Vec::new();
        let mut data = &section.data[..];
        while !data.is_empty() {
            let (rel, tail) = from_bytes::<elf::Rel32<Endianness>>(data)
                .ok_or(Error("Invalid relocation table"))?;
            let r_info = rel.r_info.get(endian);
            relocations.push(Relocation {
                r_offset: rel.r_offset.get(endian),
                r_sym: r_info >> 8,
                r_type: r_info as u8,
            });
            data = tail;
        }
        Ok(relocations)
    }
}
