//! # Stream demultiplexer
//!
//! Copies the audio and video tags of one indexed FLV file into separate
//! output files, plus a timecode file for the video frames.
//!
//! Outputs are named `<stem>.<kind>.<ext>` and created lazily, when the first
//! tag of their stream is met, so a file without audio produces no audio
//! output. The format of each output follows the first codec seen:
//!
//! | stream | codec | output |
//! |---|---|---|
//! | audio | MP3 | `.mp3`, raw frames |
//! | audio | AAC | `.aac`, ADTS |
//! | audio | linear PCM | `.wav` |
//! | audio | anything else | `.flv`, audio only |
//! | video | AVC | `.264`, Annex B |
//! | video | HEVC | `.265`, Annex B |
//! | video | anything else | `.flv`, video only |
//! | timecodes | | `.txt`, timecode format v2 |
//!
//! Problems confined to a tag or to one output never fail the call. They are
//! returned as warnings and, for I/O failures, switch that one stream off.

pub mod audio;
pub mod timecodes;
pub mod video;

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use flv::audio::SoundFormat;
use flv::header::FlvHeader;
use flv::tag::{FlvTag, FlvTagHeader, FlvTagType, TagIndex};
use flv::video::VideoCodecId;
use flv::writer::FlvWriter;
use flv::{FlvError, FlvReader};
use serde::Serialize;
use tracing::{debug, warn};

use self::audio::{AdtsWriter, Mp3Writer, WavWriter, audio_extension};
use self::timecodes::TimecodeWriter;
use self::video::{AnnexBCodec, AnnexBWriter, video_extension};

/// The kinds of output produced per input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
    Timecodes,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Audio => "audio",
            StreamKind::Video => "video",
            StreamKind::Timecodes => "timecodes",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An output file written during one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub kind: StreamKind,
    pub path: PathBuf,
}

/// Sink for the tags of one stream.
pub trait StreamWriter {
    /// Writes one tag. Returns a warning when the tag had to be dropped.
    ///
    /// Only failures of the underlying sink are errors.
    fn write_tag(&mut self, tag: &FlvTag, payload: &[u8]) -> io::Result<Option<String>>;

    /// Frames dropped because no decoder configuration had arrived yet.
    fn frames_before_config(&self) -> u64 {
        0
    }

    /// Flushes the sink and completes any headers.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Maps input timestamps onto a zero-based timeline that never goes back.
#[derive(Debug, Clone, Default)]
pub struct StreamClock {
    base: Option<u32>,
    last: u32,
}

impl StreamClock {
    pub fn next(&mut self, timestamp_ms: u32) -> u32 {
        let base = *self.base.get_or_insert(timestamp_ms);
        let rebased = timestamp_ms.saturating_sub(base).max(self.last);
        self.last = rebased;
        rebased
    }
}

/// Re-wraps the tags of one stream into an FLV file of their own.
pub struct FlvStreamWriter<W: Write> {
    writer: FlvWriter<W>,
    tag_type: FlvTagType,
    clock: StreamClock,
}

impl<W: Write> FlvStreamWriter<W> {
    /// Writes the file header announcing only `tag_type`.
    pub fn new(out: W, tag_type: FlvTagType) -> io::Result<Self> {
        let mut writer = FlvWriter::new(out);
        writer.write_header(&FlvHeader::new(
            tag_type == FlvTagType::Audio,
            tag_type == FlvTagType::Video,
        ))?;
        Ok(Self {
            writer,
            tag_type,
            clock: StreamClock::default(),
        })
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.close()
    }
}

impl<W: Write> StreamWriter for FlvStreamWriter<W> {
    fn write_tag(&mut self, tag: &FlvTag, payload: &[u8]) -> io::Result<Option<String>> {
        let timestamp = self.clock.next(tag.timestamp_ms);
        self.writer.write_tag(self.tag_type, payload, timestamp)?;
        Ok(None)
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.into_inner().map(drop)
    }
}

/// Result of demultiplexing one file.
#[derive(Debug, Clone, Default)]
pub struct DemuxOutput {
    pub warnings: Vec<String>,
    pub outputs: Vec<OutputFile>,
}

/// Where a stream stands during one call.
enum Slot<T> {
    /// Requested, output not created yet
    Pending,
    Open { path: PathBuf, writer: T },
    /// Not requested, declined, or failed
    Off,
}

impl<T> Slot<T> {
    fn new(requested: bool) -> Self {
        if requested { Slot::Pending } else { Slot::Off }
    }

    fn is_off(&self) -> bool {
        matches!(self, Slot::Off)
    }
}

type FileSink = BufWriter<File>;

/// Demultiplexes the streams of one input file.
pub struct Demuxer<'a> {
    input: &'a Path,
    output_dir: Option<&'a Path>,
}

impl<'a> Demuxer<'a> {
    /// Outputs go to `output_dir`, or next to `input` when `None`.
    pub fn new(input: &'a Path, output_dir: Option<&'a Path>) -> Self {
        Self { input, output_dir }
    }

    /// `<dir>/<input stem>.<kind>.<extension>`
    pub fn output_path(&self, kind: StreamKind, extension: &str) -> PathBuf {
        let dir = self
            .output_dir
            .or_else(|| self.input.parent())
            .unwrap_or_else(|| Path::new(""));

        let mut name = self.input.file_stem().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(kind.as_str());
        name.push(".");
        name.push(extension);
        dir.join(name)
    }

    /// Writes the requested `kinds` for the tags in `tags`.
    ///
    /// `overwrite_confirm` is asked before an existing file is replaced;
    /// `false` leaves it untouched and skips that kind. Only failures to read
    /// the input are errors.
    pub fn extract_streams<R: Read + Seek>(
        &self,
        reader: &mut FlvReader<R>,
        tags: &TagIndex,
        kinds: &[StreamKind],
        overwrite_confirm: &mut dyn FnMut(&Path) -> bool,
    ) -> Result<DemuxOutput, FlvError> {
        let mut session = Session {
            demuxer: self,
            overwrite_confirm,
            output: DemuxOutput::default(),
            audio: Slot::new(kinds.contains(&StreamKind::Audio)),
            video: Slot::new(kinds.contains(&StreamKind::Video)),
            timecodes: Slot::new(kinds.contains(&StreamKind::Timecodes)),
            sound_format: None,
            video_codec: None,
        };

        for tag in tags {
            match &tag.header {
                FlvTagHeader::Audio(header) => {
                    if session.audio.is_off() {
                        continue;
                    }
                    let format = *session.sound_format.get_or_insert(header.sound_format);
                    if header.sound_format != format {
                        session.warn(format!(
                            "audio format changed from {format} to {} at offset {}, tag skipped",
                            header.sound_format, tag.offset
                        ));
                        continue;
                    }
                    let payload = reader.read_at(tag.payload_offset, tag.payload_size as usize)?;
                    session.audio_tag(tag, format, &payload);
                }
                FlvTagHeader::Video(header) => {
                    if session.video.is_off() && session.timecodes.is_off() {
                        continue;
                    }
                    let codec = *session.video_codec.get_or_insert(header.codec_id);
                    if header.codec_id != codec {
                        session.warn(format!(
                            "video codec changed from {codec} to {} at offset {}, tag skipped",
                            header.codec_id, tag.offset
                        ));
                        continue;
                    }
                    if !session.video.is_off() {
                        let payload =
                            reader.read_at(tag.payload_offset, tag.payload_size as usize)?;
                        session.video_tag(tag, codec, &payload);
                    }
                    if header.is_frame() {
                        session.timecode(tag);
                    }
                }
                FlvTagHeader::Script => {}
            }
        }

        Ok(session.finish())
    }
}

struct Session<'d, 'c> {
    demuxer: &'d Demuxer<'d>,
    overwrite_confirm: &'c mut dyn FnMut(&Path) -> bool,
    output: DemuxOutput,
    audio: Slot<Box<dyn StreamWriter>>,
    video: Slot<Box<dyn StreamWriter>>,
    timecodes: Slot<TimecodeWriter<FileSink>>,
    sound_format: Option<SoundFormat>,
    video_codec: Option<VideoCodecId>,
}

impl Session<'_, '_> {
    fn warn(&mut self, message: String) {
        warn!(path = %self.demuxer.input.display(), "{message}");
        self.output.warnings.push(message);
    }

    /// Creates the output for `kind`, asking before replacing a file.
    /// `None` means the kind is switched off; the reason is already recorded.
    fn open(&mut self, kind: StreamKind, extension: &str) -> Option<(PathBuf, FileSink)> {
        let path = self.demuxer.output_path(kind, extension);

        if path.exists() && !(self.overwrite_confirm)(&path) {
            self.warn(format!(
                "{} already exists and was kept, {kind} not extracted",
                path.display()
            ));
            return None;
        }

        match File::create(&path) {
            Ok(file) => {
                debug!(path = %path.display(), %kind, "created output");
                self.output.outputs.push(OutputFile {
                    kind,
                    path: path.clone(),
                });
                Some((path, BufWriter::new(file)))
            }
            Err(e) => {
                self.warn(format!("cannot create {}: {e}, {kind} not extracted", path.display()));
                None
            }
        }
    }

    fn audio_tag(&mut self, tag: &FlvTag, format: SoundFormat, payload: &[u8]) {
        if let Slot::Pending = self.audio {
            self.audio = match self.open(StreamKind::Audio, audio_extension(format)) {
                Some((path, out)) => match audio_writer(format, tag, out) {
                    Ok(writer) => Slot::Open { path, writer },
                    Err(e) => {
                        self.write_failed(StreamKind::Audio, &path, &e);
                        Slot::Off
                    }
                },
                None => Slot::Off,
            };
        }

        if let Slot::Open { path, writer } = &mut self.audio {
            match writer.write_tag(tag, payload) {
                Ok(None) => {}
                Ok(Some(warning)) => self.warn(warning),
                Err(e) => {
                    let path = path.clone();
                    self.audio = Slot::Off;
                    self.write_failed(StreamKind::Audio, &path, &e);
                }
            }
        }
    }

    fn video_tag(&mut self, tag: &FlvTag, codec: VideoCodecId, payload: &[u8]) {
        if let Slot::Pending = self.video {
            self.video = match self.open(StreamKind::Video, video_extension(codec)) {
                Some((path, out)) => match video_writer(codec, out) {
                    Ok(writer) => Slot::Open { path, writer },
                    Err(e) => {
                        self.write_failed(StreamKind::Video, &path, &e);
                        Slot::Off
                    }
                },
                None => Slot::Off,
            };
        }

        if let Slot::Open { path, writer } = &mut self.video {
            match writer.write_tag(tag, payload) {
                Ok(None) => {}
                Ok(Some(warning)) => self.warn(warning),
                Err(e) => {
                    let path = path.clone();
                    self.video = Slot::Off;
                    self.write_failed(StreamKind::Video, &path, &e);
                }
            }
        }
    }

    fn timecode(&mut self, tag: &FlvTag) {
        if let Slot::Pending = self.timecodes {
            self.timecodes = match self.open(StreamKind::Timecodes, "txt") {
                Some((path, out)) => Slot::Open {
                    path,
                    writer: TimecodeWriter::new(out),
                },
                None => Slot::Off,
            };
        }

        if let Slot::Open { writer, .. } = &mut self.timecodes {
            writer.push(tag);
        }
    }

    fn write_failed(&mut self, kind: StreamKind, path: &Path, err: &io::Error) {
        self.warn(format!(
            "writing {} failed: {err}, {kind} extraction stopped",
            path.display()
        ));
    }

    fn finish(mut self) -> DemuxOutput {
        for (kind, slot) in [
            (StreamKind::Audio, std::mem::replace(&mut self.audio, Slot::Off)),
            (StreamKind::Video, std::mem::replace(&mut self.video, Slot::Off)),
        ] {
            if let Slot::Open { path, writer } = slot {
                let skipped = writer.frames_before_config();
                if skipped > 0 {
                    self.warn(format!(
                        "{skipped} {kind} frame(s) before the first sequence header skipped"
                    ));
                }
                if let Err(e) = writer.finish() {
                    self.write_failed(kind, &path, &e);
                }
            }
        }

        if let Slot::Open { path, writer } = std::mem::replace(&mut self.timecodes, Slot::Off) {
            debug!(frames = writer.len(), "writing timecodes");
            if let Err(e) = writer.into_inner() {
                self.write_failed(StreamKind::Timecodes, &path, &e);
            }
        }

        self.output
    }
}

fn audio_writer(
    format: SoundFormat,
    first_tag: &FlvTag,
    out: FileSink,
) -> io::Result<Box<dyn StreamWriter>> {
    Ok(match format {
        SoundFormat::Mp3 | SoundFormat::Mp38k => Box::new(Mp3Writer::new(out)),
        SoundFormat::Aac => Box::new(AdtsWriter::new(out)),
        SoundFormat::Pcm | SoundFormat::PcmLe => match first_tag.audio_header() {
            Some(header) => Box::new(WavWriter::new(out, header)?),
            None => Box::new(FlvStreamWriter::new(out, FlvTagType::Audio)?),
        },
        _ => Box::new(FlvStreamWriter::new(out, FlvTagType::Audio)?),
    })
}

fn video_writer(codec: VideoCodecId, out: FileSink) -> io::Result<Box<dyn StreamWriter>> {
    Ok(match AnnexBCodec::from_codec_id(codec) {
        Some(annex_b) => Box::new(AnnexBWriter::new(out, annex_b)),
        None => Box::new(FlvStreamWriter::new(out, FlvTagType::Video)?),
    })
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Cursor;

    use flv::FlvParser;

    use super::*;
    use crate::test_utils::{FlvFileBuilder, avc_frame, avc_sequence_header, init_tracing, video_tag};

    fn demux(
        bytes: Vec<u8>,
        dir: &Path,
        kinds: &[StreamKind],
        confirm: &mut dyn FnMut(&Path) -> bool,
    ) -> DemuxOutput {
        let input = dir.join("clip.flv");
        let mut reader = FlvReader::new(Cursor::new(bytes)).unwrap();
        let parsed = FlvParser::parse_tags(&mut reader).unwrap();
        Demuxer::new(&input, None)
            .extract_streams(&mut reader, &parsed.tags, kinds, confirm)
            .unwrap()
    }

    #[test]
    fn test_output_paths() {
        let demuxer = Demuxer::new(Path::new("/media/show.ep1.flv"), None);
        assert_eq!(
            demuxer.output_path(StreamKind::Audio, "aac"),
            PathBuf::from("/media/show.ep1.audio.aac")
        );

        let demuxer = Demuxer::new(Path::new("clip.flv"), Some(Path::new("/out")));
        assert_eq!(
            demuxer.output_path(StreamKind::Timecodes, "txt"),
            PathBuf::from("/out/clip.timecodes.txt")
        );

        let demuxer = Demuxer::new(Path::new("clip.flv"), None);
        assert_eq!(
            demuxer.output_path(StreamKind::Video, "264"),
            PathBuf::from("clip.video.264")
        );
    }

    #[test]
    fn test_stream_clock() {
        let mut clock = StreamClock::default();
        assert_eq!(clock.next(5000), 0);
        assert_eq!(clock.next(5040), 40);
        assert_eq!(clock.next(5020), 40);
        assert_eq!(clock.next(4000), 40);
        assert_eq!(clock.next(5100), 100);
    }

    #[test]
    fn test_flv_stream_writer_rebases_timestamps() {
        let mut writer = FlvStreamWriter::new(Vec::new(), FlvTagType::Video).unwrap();
        for timestamp in [1000, 1040, 1020] {
            let (tag, payload) = video_tag(timestamp, &[0x24, 0x00, 0x11]);
            assert_eq!(writer.write_tag(&tag, &payload).unwrap(), None);
        }
        let bytes = writer.into_inner().unwrap();

        let mut reader = FlvReader::new(Cursor::new(bytes)).unwrap();
        let parsed = FlvParser::parse_tags(&mut reader).unwrap();
        assert!(!parsed.header.has_audio && parsed.header.has_video);
        let timestamps: Vec<u32> = parsed.tags.iter().map(|tag| tag.timestamp_ms).collect();
        assert_eq!(timestamps, vec![0, 40, 40]);
    }

    #[test]
    fn test_codec_change_is_skipped() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let bytes = FlvFileBuilder::new()
            .video(0, &avc_sequence_header())
            .video(0, &avc_frame(true, 0, &[&[0x65, 0x01]]))
            .video(40, &[0x22, 0x00, 0x01])
            .video(80, &avc_frame(false, 0, &[&[0x41, 0x01]]))
            .build();

        let output = demux(
            bytes,
            dir.path(),
            &[StreamKind::Video, StreamKind::Timecodes],
            &mut |_| true,
        );

        assert_eq!(output.warnings.len(), 1, "{:?}", output.warnings);
        assert!(output.warnings[0].contains("video codec changed from AVC to Sorenson H.263"));
        let timecodes = std::fs::read_to_string(dir.path().join("clip.timecodes.txt")).unwrap();
        assert_eq!(timecodes, "# timecode format v2\n0\n80\n");
        assert_eq!(output.outputs.len(), 2);
    }

    #[test]
    fn test_frames_before_sequence_header() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = FlvFileBuilder::new()
            .video(0, &avc_frame(true, 0, &[&[0x65, 0x01]]))
            .video(40, &avc_frame(false, 0, &[&[0x41, 0x01]]))
            .video(80, &avc_sequence_header())
            .video(80, &avc_frame(true, 0, &[&[0x65, 0x02]]))
            .build();

        let output = demux(bytes, dir.path(), &[StreamKind::Video], &mut |_| true);
        assert_eq!(output.warnings, vec![
            "2 video frame(s) before the first sequence header skipped".to_string()
        ]);
    }

    #[test]
    fn test_nothing_requested_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = FlvFileBuilder::new()
            .video(0, &avc_sequence_header())
            .audio(0, &[0x2F, 0xFF, 0xFB])
            .build();

        let output = demux(bytes, dir.path(), &[], &mut |_| true);
        assert!(output.outputs.is_empty());
        assert!(output.warnings.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
