//! # FLV Video Module
//!
//! Decoding of the video tag header, both the legacy layout (frame type and
//! codec id nibbles, followed for AVC/HEVC by a packet type and a signed
//! composition time) and the E-RTMP v2 extended layout (frame type, packet
//! type and a FourCC).
//!
//! ## Specifications
//!
//! - [Flash Video File Format Specification v10](https://www.adobe.com/content/dam/acom/en/devnet/flv/video_file_format_spec_v10.pdf)
//! - [E-RTMP v2 specification](https://github.com/veovera/enhanced-rtmp/blob/main/docs/enhanced/enhanced-rtmp-v2.md#enhanced-video)

use std::fmt;

/// Represents the type of video frame in an FLV video tag
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum VideoFrameType {
    /// Key frame (for AVC, a seekable frame)
    KeyFrame,
    /// Inter frame, for AVC, a non-key seekable frame
    InterFrame,
    /// Disposable inter frame, H.263 only
    DisposableInterFrame,
    /// Generated key frame, reserved for server use only
    GeneratedKeyFrame,
    /// Video info/command frame, carries no picture
    VideoInfoFrame,
    Reserved(u8),
}

impl From<u8> for VideoFrameType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::KeyFrame,
            2 => Self::InterFrame,
            3 => Self::DisposableInterFrame,
            4 => Self::GeneratedKeyFrame,
            5 => Self::VideoInfoFrame,
            other => Self::Reserved(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum VideoCodecId {
    SorensonH263,
    ScreenVideo,
    On2Vp6,
    On2Vp6Alpha,
    ScreenVideo2,
    Avc,
    /// HEVC signalled with codec id 12, common in Chinese streaming sites
    LegacyHevc,
    /// Extended header, codec identified by its FourCC
    Enhanced([u8; 4]),
    Unknown(u8),
}

impl From<u8> for VideoCodecId {
    fn from(value: u8) -> Self {
        match value {
            2 => Self::SorensonH263,
            3 => Self::ScreenVideo,
            4 => Self::On2Vp6,
            5 => Self::On2Vp6Alpha,
            6 => Self::ScreenVideo2,
            7 => Self::Avc,
            12 => Self::LegacyHevc,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for VideoCodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SorensonH263 => write!(f, "Sorenson H.263"),
            Self::ScreenVideo => write!(f, "Screen Video"),
            Self::On2Vp6 => write!(f, "On2 VP6"),
            Self::On2Vp6Alpha => write!(f, "On2 VP6 with alpha"),
            Self::ScreenVideo2 => write!(f, "Screen Video 2"),
            Self::Avc => write!(f, "AVC"),
            Self::LegacyHevc => write!(f, "HEVC"),
            Self::Enhanced(four_cc) => write!(f, "{}", String::from_utf8_lossy(four_cc)),
            Self::Unknown(value) => write!(f, "unknown codec {value}"),
        }
    }
}

/// What an AVC/HEVC style tag carries.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum VideoPacketType {
    /// Decoder configuration record
    SequenceHeader,
    /// One coded picture
    Frame,
    EndOfSequence,
    Other(u8),
}

/// The decoded video tag header.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct VideoTagHeader {
    pub frame_type: VideoFrameType,
    pub codec_id: VideoCodecId,
    /// `None` for codecs without a packet type (H.263, VP6, screen video)
    pub packet_type: Option<VideoPacketType>,
    /// Presentation minus decode time, in milliseconds
    pub composition_time: i32,
    /// Payload bytes taken by the header, codec data starts after them
    pub header_size: usize,
}

const EX_HEADER_FLAG: u8 = 0b1000_0000;

impl VideoTagHeader {
    /// Decodes the header from the first bytes of a video payload.
    ///
    /// Returns `None` for an empty payload. Fields that would lie beyond the
    /// provided bytes are reported as missing (`packet_type == None`).
    pub fn parse(data: &[u8]) -> Option<Self> {
        let first = *data.first()?;

        if first & EX_HEADER_FLAG != 0 {
            return Some(Self::parse_enhanced(first, data));
        }

        let frame_type = VideoFrameType::from((first >> 4) & 0x0F);
        let codec_id = VideoCodecId::from(first & 0x0F);

        let (packet_type, composition_time, header_size) = match codec_id {
            VideoCodecId::Avc | VideoCodecId::LegacyHevc => match data.get(1) {
                Some(packet_type) => {
                    let packet_type = match packet_type {
                        0 => VideoPacketType::SequenceHeader,
                        1 => VideoPacketType::Frame,
                        2 => VideoPacketType::EndOfSequence,
                        other => VideoPacketType::Other(*other),
                    };
                    (Some(packet_type), read_si24(data, 2).unwrap_or(0), 5)
                }
                None => (None, 0, 1),
            },
            _ => (None, 0, 1),
        };

        Some(Self {
            frame_type,
            codec_id,
            packet_type,
            composition_time,
            header_size: header_size.min(data.len().max(1)),
        })
    }

    fn parse_enhanced(first: u8, data: &[u8]) -> Self {
        let frame_type = VideoFrameType::from((first >> 4) & 0x07);
        let raw_packet_type = first & 0x0F;

        let four_cc = data
            .get(1..5)
            .map(|bytes| [bytes[0], bytes[1], bytes[2], bytes[3]])
            .unwrap_or([0; 4]);

        let packet_type = match raw_packet_type {
            0 => VideoPacketType::SequenceHeader,
            1 | 3 => VideoPacketType::Frame,
            2 => VideoPacketType::EndOfSequence,
            other => VideoPacketType::Other(other),
        };

        // CodedFrames for avc1/hvc1 carry a composition time, CodedFramesX does not
        let has_composition_time =
            raw_packet_type == 1 && matches!(&four_cc, b"avc1" | b"hvc1");
        let (composition_time, header_size) = if has_composition_time {
            (read_si24(data, 5).unwrap_or(0), 8)
        } else {
            (0, 5)
        };

        Self {
            frame_type,
            codec_id: VideoCodecId::Enhanced(four_cc),
            packet_type: Some(packet_type),
            composition_time,
            header_size: header_size.min(data.len()),
        }
    }

    /// Whether the tag carries a picture, as opposed to configuration,
    /// end-of-sequence markers or command frames.
    pub fn is_frame(&self) -> bool {
        self.frame_type != VideoFrameType::VideoInfoFrame
            && matches!(self.packet_type, None | Some(VideoPacketType::Frame))
    }

    pub fn is_sequence_header(&self) -> bool {
        self.packet_type == Some(VideoPacketType::SequenceHeader)
    }

    pub fn is_key_frame(&self) -> bool {
        self.frame_type == VideoFrameType::KeyFrame
    }
}

fn read_si24(data: &[u8], at: usize) -> Option<i32> {
    let bytes = data.get(at..at + 3)?;
    let value = ((bytes[0] as i32) << 16) | ((bytes[1] as i32) << 8) | bytes[2] as i32;
    // sign extend from 24 bits
    Some((value << 8) >> 8)
}
