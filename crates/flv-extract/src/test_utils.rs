//! # Test Utilities
//!
//! Builders for synthetic FLV files and tag payloads shared by the unit tests.

use std::path::Path;

use flv::audio::AudioTagHeader;
use flv::tag::{FlvTag, FlvTagHeader};
use flv::video::VideoTagHeader;

/// Initialize tracing for tests with appropriate settings
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub const AVC_SPS: &[u8] = &[0x67, 0x64, 0x00, 0x1F, 0xAC];
pub const AVC_PPS: &[u8] = &[0x68, 0xEE, 0x3C, 0x80];

/// AVC sequence header tag payload carrying one SPS and one PPS, 4-byte NAL
/// unit lengths.
pub fn avc_sequence_header() -> Vec<u8> {
    let mut payload = vec![0x17, 0x00, 0x00, 0x00, 0x00];
    payload.extend_from_slice(&[0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE1]);
    payload.extend_from_slice(&(AVC_SPS.len() as u16).to_be_bytes());
    payload.extend_from_slice(AVC_SPS);
    payload.push(0x01);
    payload.extend_from_slice(&(AVC_PPS.len() as u16).to_be_bytes());
    payload.extend_from_slice(AVC_PPS);
    payload
}

/// AVC frame tag payload with length-prefixed NAL units.
pub fn avc_frame(key_frame: bool, composition_time: i32, nalus: &[&[u8]]) -> Vec<u8> {
    let mut payload = vec![if key_frame { 0x17 } else { 0x27 }, 0x01];
    payload.extend_from_slice(&composition_time.to_be_bytes()[1..]);
    for nalu in nalus {
        payload.extend_from_slice(&(nalu.len() as u32).to_be_bytes());
        payload.extend_from_slice(nalu);
    }
    payload
}

/// AAC LC, 44.1 kHz, stereo.
pub fn aac_sequence_header() -> Vec<u8> {
    vec![0xAF, 0x00, 0x12, 0x10]
}

pub fn aac_raw(frame: &[u8]) -> Vec<u8> {
    let mut payload = vec![0xAF, 0x01];
    payload.extend_from_slice(frame);
    payload
}

/// An indexed audio tag as the parser would produce it, with its payload.
pub fn audio_tag(timestamp_ms: u32, payload: &[u8]) -> (FlvTag, Vec<u8>) {
    let header = AudioTagHeader::parse(payload).expect("audio payload must not be empty");
    (tag(timestamp_ms, payload, FlvTagHeader::Audio(header)), payload.to_vec())
}

/// An indexed video tag as the parser would produce it, with its payload.
pub fn video_tag(timestamp_ms: u32, payload: &[u8]) -> (FlvTag, Vec<u8>) {
    let header = VideoTagHeader::parse(payload).expect("video payload must not be empty");
    (tag(timestamp_ms, payload, FlvTagHeader::Video(header)), payload.to_vec())
}

fn tag(timestamp_ms: u32, payload: &[u8], header: FlvTagHeader) -> FlvTag {
    FlvTag {
        offset: 13,
        timestamp_ms,
        stream_id: 0,
        payload_offset: 24,
        payload_size: payload.len() as u32,
        header,
    }
}

/// Assembles FLV bytes tag by tag.
pub struct FlvFileBuilder {
    bytes: Vec<u8>,
}

impl FlvFileBuilder {
    pub fn new() -> Self {
        let mut bytes = b"FLV\x01\x05\x00\x00\x00\x09".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        Self { bytes }
    }

    pub fn audio(self, timestamp_ms: u32, payload: &[u8]) -> Self {
        self.tag(8, timestamp_ms, payload)
    }

    pub fn video(self, timestamp_ms: u32, payload: &[u8]) -> Self {
        self.tag(9, timestamp_ms, payload)
    }

    pub fn tag(mut self, tag_type: u8, timestamp_ms: u32, payload: &[u8]) -> Self {
        self.header(tag_type, payload.len() as u32, timestamp_ms);
        self.bytes.extend_from_slice(payload);
        self.bytes
            .extend_from_slice(&(11 + payload.len() as u32).to_be_bytes());
        self
    }

    fn header(&mut self, tag_type: u8, data_size: u32, timestamp_ms: u32) {
        self.bytes.push(tag_type);
        self.bytes.extend_from_slice(&data_size.to_be_bytes()[1..]);
        self.bytes.extend_from_slice(&timestamp_ms.to_be_bytes()[1..]);
        self.bytes.push((timestamp_ms >> 24) as u8);
        self.bytes.extend_from_slice(&[0, 0, 0]);
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.bytes).expect("failed to write test FLV file");
    }
}
