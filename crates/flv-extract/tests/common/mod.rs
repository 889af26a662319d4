//! Synthetic FLV files for the integration tests.
#![allow(dead_code)]

use std::path::Path;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub const AVC_SPS: &[u8] = &[0x67, 0x42, 0xC0, 0x1E, 0xDA];
pub const AVC_PPS: &[u8] = &[0x68, 0xCE, 0x3C, 0x80];

pub fn avc_sequence_header() -> Vec<u8> {
    let mut payload = vec![0x17, 0x00, 0x00, 0x00, 0x00, 0x01, 0x42, 0xC0, 0x1E, 0xFF, 0xE1];
    payload.extend_from_slice(&(AVC_SPS.len() as u16).to_be_bytes());
    payload.extend_from_slice(AVC_SPS);
    payload.push(0x01);
    payload.extend_from_slice(&(AVC_PPS.len() as u16).to_be_bytes());
    payload.extend_from_slice(AVC_PPS);
    payload
}

pub fn avc_frame(key_frame: bool, nalu: &[u8]) -> Vec<u8> {
    let mut payload = vec![if key_frame { 0x17 } else { 0x27 }, 0x01, 0x00, 0x00, 0x00];
    payload.extend_from_slice(&(nalu.len() as u32).to_be_bytes());
    payload.extend_from_slice(nalu);
    payload
}

/// Legacy (codec id 12) HEVC sequence header with one VPS, 4-byte lengths.
pub fn hevc_sequence_header() -> Vec<u8> {
    let mut payload = vec![0x1C, 0x00, 0x00, 0x00, 0x00];
    let mut record = vec![0u8; 22];
    record[0] = 1;
    record[21] = 0x03;
    payload.extend_from_slice(&record);
    payload.push(1);
    payload.extend_from_slice(&[0xA0, 0x00, 0x01, 0x00, 0x02, 0x40, 0x01]);
    payload
}

pub fn hevc_frame(nalu: &[u8]) -> Vec<u8> {
    let mut payload = vec![0x1C, 0x01, 0x00, 0x00, 0x00];
    payload.extend_from_slice(&(nalu.len() as u32).to_be_bytes());
    payload.extend_from_slice(nalu);
    payload
}

pub fn aac_sequence_header() -> Vec<u8> {
    vec![0xAF, 0x00, 0x12, 0x10]
}

pub fn aac_raw(frame: &[u8]) -> Vec<u8> {
    let mut payload = vec![0xAF, 0x01];
    payload.extend_from_slice(frame);
    payload
}

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
        self.back_pointer(payload.len());
        self
    }

    /// A tag whose header claims `declared` payload bytes while only
    /// `payload` follows.
    pub fn corrupt_video(mut self, timestamp_ms: u32, declared: u32, payload: &[u8]) -> Self {
        self.header(9, declared, timestamp_ms);
        self.bytes.extend_from_slice(payload);
        self.back_pointer(payload.len());
        self
    }

    fn header(&mut self, tag_type: u8, data_size: u32, timestamp_ms: u32) {
        self.bytes.push(tag_type);
        self.bytes.extend_from_slice(&data_size.to_be_bytes()[1..]);
        self.bytes.extend_from_slice(&timestamp_ms.to_be_bytes()[1..]);
        self.bytes.push((timestamp_ms >> 24) as u8);
        self.bytes.extend_from_slice(&[0, 0, 0]);
    }

    fn back_pointer(&mut self, payload_len: usize) {
        self.bytes
            .extend_from_slice(&(11 + payload_len as u32).to_be_bytes());
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.bytes).expect("failed to write test FLV file");
    }
}

/// AVC video at a fixed interval with AAC audio every 23 ms.
pub fn avc_aac_file(path: &Path, frames: u32, interval_ms: u32) {
    let mut builder = FlvFileBuilder::new()
        .video(0, &avc_sequence_header())
        .audio(0, &aac_sequence_header());
    for i in 0..frames {
        builder = builder
            .video(i * interval_ms, &avc_frame(i == 0, &[0x65, i as u8, 0x80]))
            .audio(i * 23, &aac_raw(&[0x21, i as u8]));
    }
    builder.write_to(path);
}
