use std::fmt::Display;
use std::io::{Read, Seek};

use crate::FLV_HEADER_SIZE;
use crate::error::FlvError;
use crate::reader::FlvReader;

const FLV_SIGNATURE: u32 = 0x464C56;

/// The 9-byte FLV file header.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvHeader {
    /// Always 'FLV' for accepted files
    pub signature: u32,
    /// Format version, 1 for every file in the wild
    pub version: u8,
    pub has_audio: bool,
    pub has_video: bool,
    /// Offset of the first byte after the header, normally 9
    pub data_offset: u32,
}

impl Display for FlvHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FLV v{} (audio: {}, video: {}, data offset: {})",
            self.version, self.has_audio, self.has_video, self.data_offset
        )
    }
}

impl FlvHeader {
    /// A version 1 header with the standard data offset.
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        Self {
            signature: FLV_SIGNATURE,
            version: 1,
            has_audio,
            has_video,
            data_offset: FLV_HEADER_SIZE as u32,
        }
    }

    /// Parses the header at the current reader position.
    ///
    /// Fails with [`FlvError::UnsupportedFormat`] when the signature is not
    /// `FLV`, when the input is too short to hold a header, or when the data
    /// offset points inside the header or past the end of the input. The
    /// version byte is returned as-is; judging it is left to the caller.
    pub fn parse<R: Read + Seek>(reader: &mut FlvReader<R>) -> Result<Self, FlvError> {
        if reader.remaining() < FLV_HEADER_SIZE as u64 {
            return Err(FlvError::UnsupportedFormat(format!(
                "input is {} bytes, too short for an FLV header",
                reader.remaining()
            )));
        }

        let signature = reader.read_u24_be()?;
        if signature != FLV_SIGNATURE {
            return Err(FlvError::UnsupportedFormat(format!(
                "not an FLV file (signature {signature:#08x})"
            )));
        }

        let version = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let data_offset = reader.read_u32_be()?;

        if (data_offset as usize) < FLV_HEADER_SIZE || data_offset as u64 > reader.len() {
            return Err(FlvError::UnsupportedFormat(format!(
                "invalid FLV data offset {data_offset}"
            )));
        }

        Ok(FlvHeader {
            signature,
            version,
            has_audio: flags & 0b0000_0100 != 0,
            has_video: flags & 0b0000_0001 != 0,
            data_offset,
        })
    }

    /// The flags byte as written to a file.
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.has_audio {
            flags |= 0b0000_0100;
        }
        if self.has_video {
            flags |= 0b0000_0001;
        }
        flags
    }
}
