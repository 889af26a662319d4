//! # flv-extract
//!
//! Pulls the audio, video and timecode streams out of FLV files and works out
//! their real frame rate.
//!
//! - [`FlvExtractor`] handles one file: parse, analyze timing, demultiplex.
//! - [`batch`] runs a list of files on a worker thread and reports each one
//!   over a channel, asking an [`OverwritePrompt`] before replacing outputs.
//!
//! ```no_run
//! use flv_extract::{ExtractConfig, FlvExtractor};
//!
//! let config = ExtractConfig::builder().audio(true).video(true).build();
//! let result = FlvExtractor::new(config)
//!     .extract_streams("input.flv".as_ref(), &mut |_existing| false)
//!     .unwrap();
//! if let Some(rate) = result.true_frame_rate {
//!     println!("{rate:#}");
//! }
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod batch;
pub mod config;
pub mod demux;
pub mod error;
pub mod extractor;
pub mod overwrite;
pub mod timing;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::{BatchExtractor, BatchHandle, BatchSummary, FileReport, FileStatus, StopFlag};
pub use config::ExtractConfig;
pub use demux::{Demuxer, OutputFile, StreamKind};
pub use error::ExtractError;
pub use extractor::{ExtractionResult, FlvExtractor};
pub use overwrite::{Decision, ForegroundPrompt, OverwritePolicy, OverwritePrompt, PromptRequest};
pub use timing::{FrameRate, FrameRates, compute_frame_rates};
