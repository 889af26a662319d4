//! # FLV Writer Module
//!
//! Writes FLV files tag by tag. Used to re-wrap a single stream whose codec
//! has no elementary stream format of its own (Nellymoser, Speex, VP6, screen
//! video, enhanced FourCC codecs) into an audio-only or video-only FLV.
//!
//! ## Usage
//!
//! ```no_run
//! use flv::header::FlvHeader;
//! use flv::writer::FlvWriter;
//! use std::fs::File;
//! use std::io::{BufWriter, Result};
//!
//! fn main() -> Result<()> {
//!     let file = BufWriter::new(File::create("video.flv")?);
//!     let mut writer = FlvWriter::new(file);
//!     writer.write_header(&FlvHeader::new(false, true))?;
//!
//!     // VP6 key frame at 0 ms
//!     writer.write_video(&[0x14, 0x00, 0x01, 0x02], 0)?;
//!     writer.close()?;
//!     Ok(())
//! }
//! ```

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::FLV_TAG_HEADER_SIZE;
use crate::header::FlvHeader;
use crate::tag::FlvTagType;

/// FLV writer over any byte sink.
pub struct FlvWriter<W: Write> {
    writer: W,
    has_audio: bool,
    has_video: bool,
    timestamp: u32,
    previous_tag_size: u32,
    tags_written: u64,
}

impl<W: Write> FlvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            has_audio: false,
            has_video: false,
            timestamp: 0,
            previous_tag_size: 0,
            tags_written: 0,
        }
    }

    /// Writes the file header followed by `PreviousTagSize0`.
    pub fn write_header(&mut self, header: &FlvHeader) -> io::Result<()> {
        self.writer.write_all(b"FLV")?;
        self.writer.write_u8(header.version)?;
        self.writer.write_u8(header.flags())?;
        self.writer.write_u32::<BigEndian>(header.data_offset)?;
        self.writer.write_u32::<BigEndian>(0)?;

        self.has_audio = header.has_audio;
        self.has_video = header.has_video;
        Ok(())
    }

    /// Writes the 11-byte tag header. The stream id is always 0.
    pub fn write_tag_header(
        &mut self,
        tag_type: FlvTagType,
        data_size: u32,
        timestamp_ms: u32,
    ) -> io::Result<()> {
        if data_size > 0x00FF_FFFF {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("tag payload of {data_size} bytes does not fit in 24 bits"),
            ));
        }

        self.writer.write_u8(tag_type.into())?;
        self.writer.write_u24::<BigEndian>(data_size)?;
        self.writer
            .write_u24::<BigEndian>(timestamp_ms & 0x00FF_FFFF)?;
        self.writer.write_u8((timestamp_ms >> 24) as u8)?;
        self.writer.write_u24::<BigEndian>(0)?;
        Ok(())
    }

    /// Writes a whole tag: header, payload and the trailing `PreviousTagSize`.
    pub fn write_tag(&mut self, tag_type: FlvTagType, data: &[u8], timestamp_ms: u32) -> io::Result<()> {
        let data_size = data.len() as u32;
        self.write_tag_header(tag_type, data_size, timestamp_ms)?;
        self.writer.write_all(data)?;

        self.previous_tag_size = data_size + FLV_TAG_HEADER_SIZE as u32;
        self.writer.write_u32::<BigEndian>(self.previous_tag_size)?;

        self.timestamp = self.timestamp.max(timestamp_ms);
        self.tags_written += 1;
        Ok(())
    }

    pub fn write_video(&mut self, data: &[u8], timestamp_ms: u32) -> io::Result<()> {
        if !self.has_video {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "FLV file not configured for video",
            ));
        }

        self.write_tag(FlvTagType::Video, data, timestamp_ms)
    }

    pub fn write_audio(&mut self, data: &[u8], timestamp_ms: u32) -> io::Result<()> {
        if !self.has_audio {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "FLV file not configured for audio",
            ));
        }

        self.write_tag(FlvTagType::Audio, data, timestamp_ms)
    }

    /// Highest timestamp written so far.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn tags_written(&self) -> u64 {
        self.tags_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flushes and returns the inner writer.
    pub fn close(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}
