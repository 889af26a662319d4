//! Video stream writers: Annex B elementary streams for AVC and HEVC.

use std::io::{self, Write};

use bytes::Bytes;
use flv::avc::{AvcDecoderConfigurationRecord, write_annex_b};
use flv::hevc::HevcDecoderConfigurationRecord;
use flv::tag::FlvTag;
use flv::video::{VideoCodecId, VideoFrameType, VideoPacketType};

use super::StreamWriter;

/// Codecs written as Annex B byte streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnexBCodec {
    Avc,
    Hevc,
}

impl AnnexBCodec {
    /// Legacy codec ids and their E-RTMP FourCC counterparts.
    pub fn from_codec_id(codec_id: VideoCodecId) -> Option<Self> {
        match codec_id {
            VideoCodecId::Avc | VideoCodecId::Enhanced([b'a', b'v', b'c', b'1']) => Some(Self::Avc),
            VideoCodecId::LegacyHevc | VideoCodecId::Enhanced([b'h', b'v', b'c', b'1']) => Some(Self::Hevc),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Avc => "AVC",
            Self::Hevc => "HEVC",
        }
    }
}

/// File extension of the output a video codec is written as.
pub fn video_extension(codec_id: VideoCodecId) -> &'static str {
    match AnnexBCodec::from_codec_id(codec_id) {
        Some(AnnexBCodec::Avc) => "264",
        Some(AnnexBCodec::Hevc) => "265",
        None => "flv",
    }
}

/// Rewrites length-prefixed NAL units as an Annex B stream, emitting the
/// parameter sets of each decoder configuration record when it arrives.
pub struct AnnexBWriter<W: Write> {
    out: W,
    codec: AnnexBCodec,
    nal_length_size: Option<u8>,
    frames_before_config: u64,
    frame: Vec<u8>,
}

impl<W: Write> AnnexBWriter<W> {
    pub fn new(out: W, codec: AnnexBCodec) -> Self {
        Self {
            out,
            codec,
            nal_length_size: None,
            frames_before_config: 0,
            frame: Vec::new(),
        }
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_config(&mut self, record: &[u8]) -> io::Result<u8> {
        let record = Bytes::copy_from_slice(record);
        self.frame.clear();
        let nal_length_size = match self.codec {
            AnnexBCodec::Avc => {
                let config = AvcDecoderConfigurationRecord::parse(record)?;
                config.write_parameter_sets(&mut self.frame)?;
                config.nal_length_size
            }
            AnnexBCodec::Hevc => {
                let config = HevcDecoderConfigurationRecord::parse(record)?;
                config.write_parameter_sets(&mut self.frame)?;
                config.nal_length_size
            }
        };
        Ok(nal_length_size)
    }
}

impl<W: Write> StreamWriter for AnnexBWriter<W> {
    fn write_tag(&mut self, tag: &FlvTag, payload: &[u8]) -> io::Result<Option<String>> {
        let Some(header) = tag.video_header() else {
            return Ok(None);
        };
        if header.frame_type == VideoFrameType::VideoInfoFrame {
            return Ok(None);
        }
        let data = payload.get(header.header_size..).unwrap_or_default();

        match header.packet_type {
            Some(VideoPacketType::SequenceHeader) => match self.write_config(data) {
                Ok(nal_length_size) => {
                    self.out.write_all(&self.frame)?;
                    self.nal_length_size = Some(nal_length_size);
                    Ok(None)
                }
                Err(e) => Ok(Some(format!(
                    "invalid {} sequence header at offset {}: {e}",
                    self.codec.name(),
                    tag.offset
                ))),
            },
            Some(VideoPacketType::Frame) => {
                let Some(nal_length_size) = self.nal_length_size else {
                    self.frames_before_config += 1;
                    return Ok(None);
                };
                // Convert into a scratch buffer so a malformed tag leaves no trace
                self.frame.clear();
                match write_annex_b(data, nal_length_size, &mut self.frame) {
                    Ok(_) => {
                        self.out.write_all(&self.frame)?;
                        Ok(None)
                    }
                    Err(e) => Ok(Some(format!(
                        "malformed {} frame at offset {} skipped: {e}",
                        self.codec.name(),
                        tag.offset
                    ))),
                }
            }
            Some(VideoPacketType::EndOfSequence) => Ok(None),
            Some(VideoPacketType::Other(value)) => Ok(Some(format!(
                "{} tag at offset {} has unsupported packet type {value}, skipped",
                self.codec.name(),
                tag.offset
            ))),
            None => Ok(Some(format!(
                "{} tag at offset {} is too short, skipped",
                self.codec.name(),
                tag.offset
            ))),
        }
    }

    fn frames_before_config(&self) -> u64 {
        self.frames_before_config
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.into_inner().map(drop)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::test_utils::{AVC_PPS, AVC_SPS, avc_frame, avc_sequence_header, video_tag};

    #[test]
    fn test_codec_mapping() {
        assert_eq!(video_extension(VideoCodecId::Avc), "264");
        assert_eq!(video_extension(VideoCodecId::Enhanced(*b"hvc1")), "265");
        assert_eq!(video_extension(VideoCodecId::LegacyHevc), "265");
        assert_eq!(video_extension(VideoCodecId::On2Vp6), "flv");
        assert_eq!(video_extension(VideoCodecId::Enhanced(*b"av01")), "flv");
        assert_eq!(
            AnnexBCodec::from_codec_id(VideoCodecId::Enhanced(*b"avc1")),
            Some(AnnexBCodec::Avc)
        );
    }

    #[test]
    fn test_avc_to_annex_b() {
        let mut writer = AnnexBWriter::new(Vec::new(), AnnexBCodec::Avc);

        let (tag, payload) = video_tag(0, &avc_frame(true, 0, &[&[0x65, 0x01]]));
        assert_eq!(writer.write_tag(&tag, &payload).unwrap(), None);
        assert_eq!(writer.frames_before_config(), 1);

        let (tag, payload) = video_tag(0, &avc_sequence_header());
        assert_eq!(writer.write_tag(&tag, &payload).unwrap(), None);

        let (tag, payload) = video_tag(0, &avc_frame(true, 0, &[&[0x06, 0x05], &[0x65, 0x88]]));
        assert_eq!(writer.write_tag(&tag, &payload).unwrap(), None);

        let mut expected = vec![0, 0, 0, 1];
        expected.extend_from_slice(AVC_SPS);
        expected.extend_from_slice(&[0, 0, 0, 1]);
        expected.extend_from_slice(AVC_PPS);
        expected.extend_from_slice(&[0, 0, 0, 1, 0x06, 0x05, 0, 0, 0, 1, 0x65, 0x88]);
        assert_eq!(writer.into_inner().unwrap(), expected);
    }

    #[test]
    fn test_malformed_frame_is_skipped_whole() {
        let mut writer = AnnexBWriter::new(Vec::new(), AnnexBCodec::Avc);
        let (tag, payload) = video_tag(0, &avc_sequence_header());
        writer.write_tag(&tag, &payload).unwrap();
        let before = writer.out.len();

        // Second length runs past the end of the tag
        let mut frame = avc_frame(false, 0, &[&[0x41, 0x9A]]);
        frame.extend_from_slice(&[0, 0, 0, 50, 0x41]);
        let (tag, payload) = video_tag(40, &frame);
        let warning = writer.write_tag(&tag, &payload).unwrap().unwrap();
        assert!(warning.starts_with("malformed AVC frame at offset"));
        assert_eq!(writer.out.len(), before);
    }

    #[test]
    fn test_end_of_sequence_and_bad_config() {
        let mut writer = AnnexBWriter::new(Vec::new(), AnnexBCodec::Hevc);
        let (tag, payload) = video_tag(0, &[0x1C, 0x02, 0, 0, 0]);
        assert_eq!(writer.write_tag(&tag, &payload).unwrap(), None);

        let (tag, payload) = video_tag(0, &[0x1C, 0x00, 0, 0, 0, 0x01, 0x02]);
        let warning = writer.write_tag(&tag, &payload).unwrap().unwrap();
        assert!(warning.starts_with("invalid HEVC sequence header"));
        assert!(writer.into_inner().unwrap().is_empty());
    }
}
