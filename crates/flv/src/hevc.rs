use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use bytes_util::{BytesCursor, BytesCursorExt, range_check};

use crate::avc::ANNEX_B_START_CODE;

/// Fixed-size prefix of an `hvcC` record, up to and including
/// `lengthSizeMinusOne`.
const HVCC_FIXED_SIZE: usize = 22;

/// One `hvcC` NAL unit array (VPS, SPS, PPS or SEI units of one type).
#[derive(Debug, Clone, PartialEq)]
pub struct NaluArray {
    pub array_completeness: bool,
    pub nal_unit_type: u8,
    pub nalus: Vec<Bytes>,
}

/// `HEVCDecoderConfigurationRecord` (ISO/IEC 14496-15 8.3.3.1).
///
/// Only the fields needed to rebuild an Annex B stream are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct HevcDecoderConfigurationRecord {
    pub general_profile_idc: u8,
    pub general_level_idc: u8,
    pub nal_length_size: u8,
    pub arrays: Vec<NaluArray>,
}

impl HevcDecoderConfigurationRecord {
    pub fn parse(data: Bytes) -> io::Result<Self> {
        if data.len() < HVCC_FIXED_SIZE + 1 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("hvcC record of {} bytes is too short", data.len()),
            ));
        }

        let version = data[0];
        if version != 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported hvcC version {version}"),
            ));
        }

        let general_profile_idc = data[1] & 0b1_1111;
        let general_level_idc = data[12];
        let nal_length_size = (data[21] & 0b11) + 1;
        range_check!(nal_length_size, 1, 4)?;

        let mut reader = BytesCursor::new(data);
        reader.set_position(HVCC_FIXED_SIZE as u64);

        let num_arrays = reader.read_u8()?;
        let mut arrays = Vec::with_capacity(num_arrays as usize);
        for _ in 0..num_arrays {
            let byte = reader.read_u8()?;
            let num_nalus = reader.read_u16::<BigEndian>()?;
            let mut nalus = Vec::with_capacity(num_nalus as usize);
            for _ in 0..num_nalus {
                let len = reader.read_u16::<BigEndian>()? as usize;
                nalus.push(reader.extract_bytes(len)?);
            }
            arrays.push(NaluArray {
                array_completeness: byte & 0x80 != 0,
                nal_unit_type: byte & 0b11_1111,
                nalus,
            });
        }

        Ok(Self {
            general_profile_idc,
            general_level_idc,
            nal_length_size,
            arrays,
        })
    }

    /// Writes every parameter set in record order with start codes.
    pub fn write_parameter_sets<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for unit in self.arrays.iter().flat_map(|array| array.nalus.iter()) {
            writer.write_all(&ANNEX_B_START_CODE)?;
            writer.write_all(unit)?;
        }
        Ok(())
    }
}
