use std::io;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

/// Byte order of a multi-byte integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Most significant byte first (network order, used by FLV).
    Big,
    /// Least significant byte first (used by RIFF/WAVE).
    Little,
}

/// Reads an unsigned integer of `size` bytes (1..=8) in the given byte order.
pub fn read_uint<R: io::Read>(reader: &mut R, size: usize, endianness: Endianness) -> io::Result<u64> {
    if size == 0 || size > 8 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("integer size must be between 1 and 8 bytes, got {size}"),
        ));
    }

    match endianness {
        Endianness::Big => reader.read_uint::<BigEndian>(size),
        Endianness::Little => reader.read_uint::<LittleEndian>(size),
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_reads_both_byte_orders() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(read_uint(&mut &data[..], 3, Endianness::Big).unwrap(), 0x010203);
        assert_eq!(read_uint(&mut &data[..], 3, Endianness::Little).unwrap(), 0x030201);
        assert_eq!(read_uint(&mut &data[..], 1, Endianness::Little).unwrap(), 0x01);
    }

    #[test]
    fn test_rejects_invalid_sizes() {
        let data = [0u8; 16];
        let err = read_uint(&mut &data[..], 0, Endianness::Big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = read_uint(&mut &data[..], 9, Endianness::Big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_short_input_is_eof() {
        let data = [0x01];
        let err = read_uint(&mut &data[..], 2, Endianness::Big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
