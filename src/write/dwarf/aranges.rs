//! Writing the `.debug_aranges` address range table.

use crate::elf;
use crate::endian::{Endianness, U16, U32};
use crate::write::elf::Relocations;
use crate::write::WritableBuffer;

/// Emit an address range table covering the whole `.text` section.
///
/// The table holds a single `(address, length)` pair followed by the zero
/// terminator pair. Both the address and the length words are covered by
/// `R_MIPS_32` relocations against `.text` so that the linker resolves the
/// final placement. The `.debug_info` offset is left at zero, which is
/// correct for a file with one compilation unit at the start of
/// `.debug_info`.
pub fn write_aranges(text_length: u32, endian: Endianness) -> (Vec<u8>, Relocations) {
    let mut result = Vec::new();
    let mut relocations = Relocations::new();

    result.write_pod(&U32::new(endian, 0x1c)); // unit length
    result.write_pod(&U16::new(endian, 2)); // version
    result.write_pod(&U32::new(endian, 0)); // .debug_info offset
    result.push(4); // address size
    result.push(0); // segment descriptor size
    result.extend_from_slice(&[0; 4]); // pad to the first tuple boundary

    relocations.add(result.len() as u32, &b".text"[..], elf::R_MIPS_32);
    result.write_pod(&U32::new(endian, 0)); // range address
    relocations.add(result.len() as u32, &b".text"[..], elf::R_MIPS_32);
    result.write_pod(&U32::new(endian, text_length)); // range length

    result.extend_from_slice(&[0; 8]); // terminator tuple

    (result, relocations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape() {
        let (data, relocations) = write_aranges(0x40, Endianness::Big);

        assert_eq!(data.len(), 32);
        assert_eq!(&data[0..4], &[0, 0, 0, 0x1c]);
        assert_eq!(&data[4..6], &[0, 2]);
        assert_eq!(&data[6..10], &[0; 4]);
        assert_eq!(data[10], 4);
        assert_eq!(data[11], 0);
        assert_eq!(&data[16..20], &[0; 4]);
        assert_eq!(&data[20..24], &[0, 0, 0, 0x40]);
        assert_eq!(&data[24..32], &[0; 8]);

        let entries = relocations.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].r_offset, 16);
        assert_eq!(entries[1].r_offset, 20);
        for entry in entries {
            assert_eq!(entry.symbol, b".text");
            assert_eq!(entry.r_type, elf::R_MIPS_32);
        }
    }
}
