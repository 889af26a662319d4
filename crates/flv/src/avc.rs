use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use bytes_util::{BytesCursor, BytesCursorExt, range_check};

pub const ANNEX_B_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// `AVCDecoderConfigurationRecord` (ISO/IEC 14496-15 5.3.3.1), the body of
/// an AVC sequence header tag.
#[derive(Debug, Clone, PartialEq)]
pub struct AvcDecoderConfigurationRecord {
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    pub level_indication: u8,
    /// Size of the length prefix in front of every NAL unit (1, 2 or 4)
    pub nal_length_size: u8,
    pub sps: Vec<Bytes>,
    pub pps: Vec<Bytes>,
}

impl AvcDecoderConfigurationRecord {
    pub fn parse(data: Bytes) -> io::Result<Self> {
        let mut reader = BytesCursor::new(data);

        let version = reader.read_u8()?;
        if version != 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported avcC version {version}"),
            ));
        }

        let profile_indication = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_indication = reader.read_u8()?;
        let nal_length_size = (reader.read_u8()? & 0b11) + 1;
        range_check!(nal_length_size, 1, 4)?;
        if nal_length_size == 3 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "3-byte NAL unit lengths are not allowed",
            ));
        }

        let sps_count = reader.read_u8()? & 0b1_1111;
        let sps = read_parameter_sets(&mut reader, sps_count as usize)?;
        let pps_count = reader.read_u8()?;
        let pps = read_parameter_sets(&mut reader, pps_count as usize)?;

        // High profile extensions (chroma format, bit depth, SPS ext) may follow;
        // they are not needed to rebuild an elementary stream.

        Ok(Self {
            profile_indication,
            profile_compatibility,
            level_indication,
            nal_length_size,
            sps,
            pps,
        })
    }

    /// Writes every SPS then every PPS with start codes.
    pub fn write_parameter_sets<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for unit in self.sps.iter().chain(self.pps.iter()) {
            writer.write_all(&ANNEX_B_START_CODE)?;
            writer.write_all(unit)?;
        }
        Ok(())
    }
}

fn read_parameter_sets(reader: &mut BytesCursor, count: usize) -> io::Result<Vec<Bytes>> {
    let mut sets = Vec::with_capacity(count);
    for _ in 0..count {
        let len = reader.read_u16::<BigEndian>()? as usize;
        sets.push(reader.extract_bytes(len)?);
    }
    Ok(sets)
}

/// Rewrites length-prefixed NAL units (as stored in FLV/MP4) as an Annex B
/// byte stream. Returns the number of units written.
///
/// A length running past the end of `data` is an error; units written before
/// it stay written.
pub fn write_annex_b<W: Write>(data: &[u8], nal_length_size: u8, writer: &mut W) -> io::Result<usize> {
    let size = nal_length_size as usize;
    let mut offset = 0;
    let mut units = 0;

    while offset + size <= data.len() {
        let len = data[offset..offset + size]
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);
        offset += size;

        let end = offset.checked_add(len).filter(|end| *end <= data.len()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("NAL unit of {len} bytes runs past the end of the packet"),
            )
        })?;

        if len > 0 {
            writer.write_all(&ANNEX_B_START_CODE)?;
            writer.write_all(&data[offset..end])?;
            units += 1;
        }
        offset = end;
    }

    Ok(units)
}
