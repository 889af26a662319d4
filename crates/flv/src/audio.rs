//! # FLV Audio Module
//!
//! Decoding of the audio tag header: the first byte of every audio payload
//! (sound format, rate, sample size, channels) and, for AAC, the packet type
//! byte that follows it.
//!
//! ## Specifications
//!
//! - [Flash Video File Format Specification v10](https://www.adobe.com/content/dam/acom/en/devnet/flv/video_file_format_spec_v10.pdf)
//! - [E-RTMP v2 specification](https://github.com/veovera/enhanced-rtmp/blob/main/docs/enhanced/enhanced-rtmp-v2.md#enhanced-audio)

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum SoundFormat {
    /// Linear PCM, platform endian (little endian in practice)
    Pcm,
    AdPcm,
    Mp3,
    /// Linear PCM, little endian
    PcmLe,
    Nellymoser16khzMono,
    Nellymoser8khzMono,
    Nellymoser,
    G711ALaw,
    G711MuLaw,
    /// E-RTMP v2 extended header, codec given by a FourCC
    ExHeader,
    Aac,
    Speex,
    Mp38k,
    DeviceSpecific,
    /// Values 12 and 13 are reserved
    Reserved(u8),
}

impl From<u8> for SoundFormat {
    fn from(value: u8) -> Self {
        match value {
            0 => SoundFormat::Pcm,
            1 => SoundFormat::AdPcm,
            2 => SoundFormat::Mp3,
            3 => SoundFormat::PcmLe,
            4 => SoundFormat::Nellymoser16khzMono,
            5 => SoundFormat::Nellymoser8khzMono,
            6 => SoundFormat::Nellymoser,
            7 => SoundFormat::G711ALaw,
            8 => SoundFormat::G711MuLaw,
            9 => SoundFormat::ExHeader,
            10 => SoundFormat::Aac,
            11 => SoundFormat::Speex,
            14 => SoundFormat::Mp38k,
            15 => SoundFormat::DeviceSpecific,
            other => SoundFormat::Reserved(other),
        }
    }
}

impl fmt::Display for SoundFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundFormat::Pcm => write!(f, "PCM"),
            SoundFormat::AdPcm => write!(f, "ADPCM"),
            SoundFormat::Mp3 => write!(f, "MP3"),
            SoundFormat::PcmLe => write!(f, "PCM (little endian)"),
            SoundFormat::Nellymoser16khzMono => write!(f, "Nellymoser 16kHz mono"),
            SoundFormat::Nellymoser8khzMono => write!(f, "Nellymoser 8kHz mono"),
            SoundFormat::Nellymoser => write!(f, "Nellymoser"),
            SoundFormat::G711ALaw => write!(f, "G.711 A-law"),
            SoundFormat::G711MuLaw => write!(f, "G.711 mu-law"),
            SoundFormat::ExHeader => write!(f, "enhanced audio"),
            SoundFormat::Aac => write!(f, "AAC"),
            SoundFormat::Speex => write!(f, "Speex"),
            SoundFormat::Mp38k => write!(f, "MP3 8kHz"),
            SoundFormat::DeviceSpecific => write!(f, "device specific"),
            SoundFormat::Reserved(value) => write!(f, "reserved format {value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum SoundRate {
    Hz5512,
    Hz11025,
    Hz22050,
    Hz44100,
}

impl SoundRate {
    pub fn hz(&self) -> u32 {
        match self {
            SoundRate::Hz5512 => 5512,
            SoundRate::Hz11025 => 11025,
            SoundRate::Hz22050 => 22050,
            SoundRate::Hz44100 => 44100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum SoundSize {
    Bits8,
    Bits16,
}

impl SoundSize {
    pub fn bits(&self) -> u16 {
        match self {
            SoundSize::Bits8 => 8,
            SoundSize::Bits16 => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum SoundType {
    Mono,
    Stereo,
}

impl SoundType {
    pub fn channels(&self) -> u16 {
        match self {
            SoundType::Mono => 1,
            SoundType::Stereo => 2,
        }
    }
}

/// AAC packet type, the second byte of an AAC audio tag.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum AacPacketType {
    SequenceHeader,
    Raw,
    Unknown(u8),
}

impl From<u8> for AacPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AacPacketType::SequenceHeader,
            1 => AacPacketType::Raw,
            other => AacPacketType::Unknown(other),
        }
    }
}

/// The decoded audio tag header.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct AudioTagHeader {
    pub sound_format: SoundFormat,
    pub sound_rate: SoundRate,
    pub sound_size: SoundSize,
    pub sound_type: SoundType,
    /// Present for AAC tags that carry the packet type byte
    pub aac_packet_type: Option<AacPacketType>,
}

impl AudioTagHeader {
    /// Decodes the header from the first bytes of an audio payload.
    ///
    /// Returns `None` for an empty payload.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let flags = *data.first()?;

        let sound_format = SoundFormat::from(flags >> 4);
        let sound_rate = match (flags >> 2) & 0b11 {
            0 => SoundRate::Hz5512,
            1 => SoundRate::Hz11025,
            2 => SoundRate::Hz22050,
            _ => SoundRate::Hz44100,
        };
        let sound_size = if flags & 0b10 != 0 {
            SoundSize::Bits16
        } else {
            SoundSize::Bits8
        };
        let sound_type = if flags & 0b1 != 0 {
            SoundType::Stereo
        } else {
            SoundType::Mono
        };

        let aac_packet_type = match sound_format {
            SoundFormat::Aac => data.get(1).copied().map(AacPacketType::from),
            _ => None,
        };

        Some(Self {
            sound_format,
            sound_rate,
            sound_size,
            sound_type,
            aac_packet_type,
        })
    }

    /// Number of payload bytes taken by the header itself.
    pub fn header_size(&self) -> usize {
        match self.sound_format {
            SoundFormat::Aac => 2,
            _ => 1,
        }
    }

    pub fn is_sequence_header(&self) -> bool {
        self.aac_packet_type == Some(AacPacketType::SequenceHeader)
    }
}
