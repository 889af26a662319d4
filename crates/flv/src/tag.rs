//! Tag records and the tag index.
//!
//! A [`FlvTag`] describes where a tag's payload lives in the input instead of
//! holding it, so indexing a multi-gigabyte file costs a few dozen bytes per
//! tag. Payloads are fetched on demand through the reader.

use std::fmt;

use crate::audio::AudioTagHeader;
use crate::video::VideoTagHeader;

/// Tag type code from the first byte of a tag header.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
/// - video_file_format_spec_v10_1.pdf (Annex E.4.1 - FLV Tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio,
    Video,
    ScriptData,
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            _ => FlvTagType::Unknown(value),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        match value {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
            FlvTagType::Unknown(value) => value,
        }
    }
}

impl fmt::Display for FlvTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlvTagType::Audio => write!(f, "audio"),
            FlvTagType::Video => write!(f, "video"),
            FlvTagType::ScriptData => write!(f, "script"),
            FlvTagType::Unknown(value) => write!(f, "unknown ({value})"),
        }
    }
}

/// Codec level information decoded from the start of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagHeader {
    Audio(AudioTagHeader),
    Video(VideoTagHeader),
    Script,
}

/// One indexed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvTag {
    /// Offset of the 11-byte tag header in the input
    pub offset: u64,
    /// Decode timestamp in milliseconds, extended byte included
    pub timestamp_ms: u32,
    pub stream_id: u32,
    /// Offset of the first payload byte in the input
    pub payload_offset: u64,
    pub payload_size: u32,
    pub header: FlvTagHeader,
}

impl FlvTag {
    pub fn tag_type(&self) -> FlvTagType {
        match self.header {
            FlvTagHeader::Audio(_) => FlvTagType::Audio,
            FlvTagHeader::Video(_) => FlvTagType::Video,
            FlvTagHeader::Script => FlvTagType::ScriptData,
        }
    }

    pub fn audio_header(&self) -> Option<&AudioTagHeader> {
        match &self.header {
            FlvTagHeader::Audio(header) => Some(header),
            _ => None,
        }
    }

    pub fn video_header(&self) -> Option<&VideoTagHeader> {
        match &self.header {
            FlvTagHeader::Video(header) => Some(header),
            _ => None,
        }
    }

    /// Whether this is a video tag carrying a picture.
    pub fn is_video_frame(&self) -> bool {
        self.video_header().is_some_and(VideoTagHeader::is_frame)
    }
}

/// Tags in container order.
///
/// Built once by the parser and then only read. Container order is kept even
/// when timestamps go backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    tags: Vec<FlvTag>,
}

impl TagIndex {
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlvTag> {
        self.tags.iter()
    }

    pub fn get(&self, index: usize) -> Option<&FlvTag> {
        self.tags.get(index)
    }

    pub fn audio_tags(&self) -> impl Iterator<Item = &FlvTag> {
        self.tags
            .iter()
            .filter(|tag| matches!(tag.header, FlvTagHeader::Audio(_)))
    }

    pub fn video_tags(&self) -> impl Iterator<Item = &FlvTag> {
        self.tags
            .iter()
            .filter(|tag| matches!(tag.header, FlvTagHeader::Video(_)))
    }

    /// Decode timestamps of the video tags that carry pictures, in container
    /// order.
    pub fn video_frame_timestamps(&self) -> Vec<u32> {
        self.tags
            .iter()
            .filter(|tag| tag.is_video_frame())
            .map(|tag| tag.timestamp_ms)
            .collect()
    }
}

impl From<Vec<FlvTag>> for TagIndex {
    fn from(tags: Vec<FlvTag>) -> Self {
        Self { tags }
    }
}

impl<'a> IntoIterator for &'a TagIndex {
    type Item = &'a FlvTag;
    type IntoIter = std::slice::Iter<'a, FlvTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
