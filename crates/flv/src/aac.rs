//! AAC decoder configuration and ADTS framing.
//!
//! FLV carries raw AAC access units plus an `AudioSpecificConfig` in the
//! sequence header tag. A standalone `.aac` stream needs every access unit
//! prefixed with an ADTS header built from that configuration.

use std::io;

use bytes_util::{BitReader, BitWriter, range_check};

pub const ADTS_HEADER_SIZE: usize = 7;

const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// The fields of an `AudioSpecificConfig` (ISO/IEC 14496-3 1.6.2.1) that
/// ADTS can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// Audio object type of the core coder (2 = AAC LC). For explicitly
    /// signalled SBR/PS this is the underlying type, not 5 or 29.
    pub object_type: u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration: u8,
}

impl AudioSpecificConfig {
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut bits = BitReader::new(data);

        let mut object_type = read_object_type(&mut bits)?;
        let mut sampling_frequency_index = read_frequency_index(&mut bits)?;
        let channel_configuration = bits.read_bits(4)? as u8;

        // HE-AAC (5) and HE-AACv2 (29) with explicit signalling: the core
        // coder's sampling rate is the one above, the extension rate and the
        // real object type follow.
        if object_type == 5 || object_type == 29 {
            let _extension_index = read_frequency_index(&mut bits)?;
            object_type = read_object_type(&mut bits)?;
            sampling_frequency_index = sampling_frequency_index.min(12);
        }

        range_check!(object_type, 1, 4).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("AAC object type {object_type} cannot be carried in ADTS"),
            )
        })?;

        Ok(Self {
            object_type,
            sampling_frequency_index,
            channel_configuration,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATES[self.sampling_frequency_index as usize]
    }

    /// Builds the 7-byte ADTS header (no CRC) for an access unit of
    /// `payload_len` bytes.
    pub fn adts_header(&self, payload_len: usize) -> io::Result<[u8; ADTS_HEADER_SIZE]> {
        let frame_length = range_check!(payload_len + ADTS_HEADER_SIZE, ADTS_HEADER_SIZE, 0x1FFF)?;

        let mut bits = BitWriter::new();
        bits.write_bits(0xFFF, 12)?; // syncword
        bits.write_bits(0, 1)?; // MPEG-4
        bits.write_bits(0, 2)?; // layer
        bits.write_bits(1, 1)?; // protection absent
        bits.write_bits((self.object_type - 1) as u32, 2)?;
        bits.write_bits(self.sampling_frequency_index as u32, 4)?;
        bits.write_bits(0, 1)?; // private bit
        bits.write_bits(self.channel_configuration as u32 & 0x07, 3)?;
        bits.write_bits(0, 4)?; // original/copy, home, copyright bits
        bits.write_bits(frame_length as u32, 13)?;
        bits.write_bits(0x7FF, 11)?; // buffer fullness: variable bitrate
        bits.write_bits(0, 2)?; // one raw data block

        let bytes = bits.finish();
        let mut header = [0u8; ADTS_HEADER_SIZE];
        header.copy_from_slice(&bytes);
        Ok(header)
    }
}

fn read_object_type(bits: &mut BitReader<'_>) -> io::Result<u8> {
    let object_type = bits.read_bits(5)? as u8;
    if object_type == 31 {
        return Ok(32 + bits.read_bits(6)? as u8);
    }
    Ok(object_type)
}

fn read_frequency_index(bits: &mut BitReader<'_>) -> io::Result<u8> {
    let index = bits.read_bits(4)? as u8;
    if index == 15 {
        // explicit 24-bit rate, map it to the table entry ADTS needs
        let rate = bits.read_bits(24)?;
        return SAMPLE_RATES
            .iter()
            .position(|candidate| *candidate == rate)
            .map(|position| position as u8)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("AAC sample rate {rate} has no ADTS index"),
                )
            });
    }
    range_check!(index, 0, 12)
}
