use clap::Parser;
use flv_extract::{ExtractConfig, OverwritePolicy};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    name = "flvx",
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "Extract audio, video and timecodes from FLV files",
    long_about = "Splits FLV files into their elementary streams and reports frame rates.\n\
                  \n\
                  Video is written as Annex B (H.264/H.265) or re-wrapped FLV, audio as\n\
                  ADTS AAC, MP3, WAV or re-wrapped FLV, and timestamps as a timecode v2\n\
                  file. The true frame rate is estimated from the most common frame\n\
                  interval, the average frame rate from the whole video duration.\n\
                  Directories are expanded to the .flv files they contain."
)]
pub struct CliArgs {
    /// Input file(s) or directories to process
    #[arg(
        required = true,
        help = "Path to FLV file(s) or directories containing FLV files"
    )]
    pub input: Vec<PathBuf>,

    #[arg(short, long, help = "Extract the audio stream")]
    pub audio: bool,

    #[arg(short, long, help = "Extract the video stream")]
    pub video: bool,

    #[arg(short, long, help = "Write a timecode v2 file for the video frames")]
    pub timecodes: bool,

    /// Output directory for extracted streams
    #[arg(
        short,
        long,
        help = "Directory where extracted streams are written (default: next to each input)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short = 'y',
        long,
        conflicts_with = "no_overwrite",
        help = "Replace existing output files without asking"
    )]
    pub overwrite: bool,

    #[arg(
        short = 'n',
        long,
        help = "Keep existing output files without asking"
    )]
    pub no_overwrite: bool,

    #[arg(long, help = "Print one JSON report per file on stdout")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    #[arg(long, help = "Also write the log to this file")]
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    /// Streams to extract. With no stream flag given, all of them.
    pub fn extract_config(&self) -> ExtractConfig {
        let builder = if self.audio || self.video || self.timecodes {
            ExtractConfig::builder()
                .audio(self.audio)
                .video(self.video)
                .timecodes(self.timecodes)
        } else {
            ExtractConfig::builder().all_streams()
        };

        match &self.output_dir {
            Some(dir) => builder.output_dir(dir).build(),
            None => builder.build(),
        }
    }

    /// `-y` replaces and `-n` keeps existing outputs; otherwise each one is asked.
    pub fn overwrite_policy(&self) -> OverwritePolicy {
        if self.overwrite {
            OverwritePolicy::All
        } else if self.no_overwrite {
            OverwritePolicy::None
        } else {
            OverwritePolicy::Ask
        }
    }
}
