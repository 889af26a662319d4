//! Audio stream writers: raw MP3, AAC in ADTS, PCM in WAV, and audio-only
//! FLV for every other sound format.

use std::io::{self, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use flv::aac::AudioSpecificConfig;
use flv::audio::{AacPacketType, AudioTagHeader, SoundFormat};
use flv::tag::FlvTag;

use super::StreamWriter;

/// File extension of the elementary stream a sound format is written as.
pub fn audio_extension(format: SoundFormat) -> &'static str {
    match format {
        SoundFormat::Mp3 | SoundFormat::Mp38k => "mp3",
        SoundFormat::Aac => "aac",
        SoundFormat::Pcm | SoundFormat::PcmLe => "wav",
        _ => "flv",
    }
}

fn codec_data<'p>(tag: &FlvTag, payload: &'p [u8]) -> &'p [u8] {
    let skip = tag.audio_header().map_or(1, AudioTagHeader::header_size);
    payload.get(skip..).unwrap_or_default()
}

/// MP3 frames are stored as-is, so the tag bodies concatenate into a playable
/// file.
pub struct Mp3Writer<W: Write> {
    out: W,
}

impl<W: Write> Mp3Writer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> StreamWriter for Mp3Writer<W> {
    fn write_tag(&mut self, tag: &FlvTag, payload: &[u8]) -> io::Result<Option<String>> {
        self.out.write_all(codec_data(tag, payload))?;
        Ok(None)
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.into_inner().map(drop)
    }
}

/// Raw AAC frames prefixed with ADTS headers built from the last
/// AudioSpecificConfig seen.
pub struct AdtsWriter<W: Write> {
    out: W,
    config: Option<AudioSpecificConfig>,
    frames_before_config: u64,
}

impl<W: Write> AdtsWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            config: None,
            frames_before_config: 0,
        }
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> StreamWriter for AdtsWriter<W> {
    fn write_tag(&mut self, tag: &FlvTag, payload: &[u8]) -> io::Result<Option<String>> {
        let packet_type = tag.audio_header().and_then(|header| header.aac_packet_type);
        let data = codec_data(tag, payload);

        match packet_type {
            Some(AacPacketType::SequenceHeader) => match AudioSpecificConfig::parse(data) {
                Ok(config) => {
                    self.config = Some(config);
                    Ok(None)
                }
                Err(e) => Ok(Some(format!(
                    "invalid AAC sequence header at offset {}: {e}",
                    tag.offset
                ))),
            },
            Some(AacPacketType::Raw) => {
                let Some(config) = &self.config else {
                    self.frames_before_config += 1;
                    return Ok(None);
                };
                if data.is_empty() {
                    return Ok(None);
                }
                match config.adts_header(data.len()) {
                    Ok(header) => {
                        self.out.write_all(&header)?;
                        self.out.write_all(data)?;
                        Ok(None)
                    }
                    Err(e) => Ok(Some(format!(
                        "AAC frame at offset {} skipped: {e}",
                        tag.offset
                    ))),
                }
            }
            Some(AacPacketType::Unknown(value)) => Ok(Some(format!(
                "AAC tag at offset {} has unknown packet type {value}, skipped",
                tag.offset
            ))),
            None => Ok(Some(format!(
                "AAC tag at offset {} is too short, skipped",
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

const WAV_HEADER_SIZE: u64 = 44;

/// Linear PCM in a RIFF/WAVE container. The size fields are written as zero
/// and patched when the writer is finished.
pub struct WavWriter<W: Write + Seek> {
    out: W,
    data_len: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    /// Writes the RIFF header for the sample layout of `header`.
    pub fn new(mut out: W, header: &AudioTagHeader) -> io::Result<Self> {
        let channels = header.sound_type.channels();
        let sample_rate = header.sound_rate.hz();
        let bits = header.sound_size.bits();
        let block_align = channels * bits / 8;

        out.write_all(b"RIFF")?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_all(b"WAVE")?;
        out.write_all(b"fmt ")?;
        out.write_u32::<LittleEndian>(16)?;
        out.write_u16::<LittleEndian>(1)?; // WAVE_FORMAT_PCM
        out.write_u16::<LittleEndian>(channels)?;
        out.write_u32::<LittleEndian>(sample_rate)?;
        out.write_u32::<LittleEndian>(sample_rate * block_align as u32)?;
        out.write_u16::<LittleEndian>(block_align)?;
        out.write_u16::<LittleEndian>(bits)?;
        out.write_all(b"data")?;
        out.write_u32::<LittleEndian>(0)?;

        Ok(Self { out, data_len: 0 })
    }

    /// Pads the data chunk, patches both size fields and returns the sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        if self.data_len % 2 == 1 {
            self.out.write_u8(0)?;
        }
        let padded = self.data_len + self.data_len % 2;
        let riff_len = (WAV_HEADER_SIZE - 8 + padded).min(u32::MAX as u64) as u32;
        let data_len = self.data_len.min(u32::MAX as u64) as u32;

        self.out.seek(SeekFrom::Start(4))?;
        self.out.write_u32::<LittleEndian>(riff_len)?;
        self.out.seek(SeekFrom::Start(WAV_HEADER_SIZE - 4))?;
        self.out.write_u32::<LittleEndian>(data_len)?;
        self.out.seek(SeekFrom::End(0))?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write + Seek> StreamWriter for WavWriter<W> {
    fn write_tag(&mut self, tag: &FlvTag, payload: &[u8]) -> io::Result<Option<String>> {
        let samples = codec_data(tag, payload);
        self.out.write_all(samples)?;
        self.data_len += samples.len() as u64;
        Ok(None)
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.into_inner().map(drop)
    }
}
