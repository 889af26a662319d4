use std::path::{Path, PathBuf};

use flv::script::MetadataHints;
use flv::{FlvParser, FlvReader};
use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::demux::{Demuxer, OutputFile};
use crate::error::ExtractError;
use crate::timing::{FrameRate, compute_frame_rates};

/// Outcome of extracting one file.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub path: PathBuf,
    /// Parser, timing and demux warnings, in that order
    pub warnings: Vec<String>,
    pub true_frame_rate: Option<FrameRate>,
    pub average_frame_rate: Option<FrameRate>,
    pub metadata: Option<MetadataHints>,
    pub outputs: Vec<OutputFile>,
}

impl ExtractionResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Processes single FLV files according to an [`ExtractConfig`].
///
/// Holds no per-file state; every call starts from scratch.
#[derive(Debug, Clone, Default)]
pub struct FlvExtractor {
    config: ExtractConfig,
}

impl FlvExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Parses `path`, computes its frame rates and writes the configured
    /// streams.
    ///
    /// `overwrite_confirm` is called for each output that already exists.
    /// The input file is closed before this returns, on success or failure.
    pub fn extract_streams(
        &self,
        path: &Path,
        overwrite_confirm: &mut dyn FnMut(&Path) -> bool,
    ) -> Result<ExtractionResult, ExtractError> {
        info!(path = %path.display(), "extracting streams");

        let mut reader = FlvReader::open(path)?;
        let parsed = FlvParser::parse_tags(&mut reader)?;
        debug!(
            path = %path.display(),
            header = %parsed.header,
            tags = parsed.tags.len(),
            "parsed FLV"
        );

        let frame_timestamps = parsed.tags.video_frame_timestamps();
        let rates = compute_frame_rates(&frame_timestamps);
        check_metadata(parsed.metadata.as_ref(), rates.true_frame_rate);

        let mut warnings = parsed.warnings;
        warnings.extend(rates.warnings);

        let kinds = self.config.kinds();
        let mut outputs = Vec::new();
        if !kinds.is_empty() {
            let output_dir = self.config.output_dir();
            if let Some(dir) = output_dir {
                std::fs::create_dir_all(dir).map_err(|source| ExtractError::Output {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }

            let demuxed = Demuxer::new(path, output_dir).extract_streams(
                &mut reader,
                &parsed.tags,
                &kinds,
                overwrite_confirm,
            )?;
            warnings.extend(demuxed.warnings);
            outputs = demuxed.outputs;
        }

        info!(
            path = %path.display(),
            warnings = warnings.len(),
            outputs = outputs.len(),
            true_frame_rate = %display_rate(rates.true_frame_rate),
            average_frame_rate = %display_rate(rates.average_frame_rate),
            "extraction finished"
        );

        Ok(ExtractionResult {
            path: path.to_path_buf(),
            warnings,
            true_frame_rate: rates.true_frame_rate,
            average_frame_rate: rates.average_frame_rate,
            metadata: parsed.metadata,
            outputs,
        })
    }
}

fn display_rate(rate: Option<FrameRate>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |rate| rate.to_string())
}

/// Logs when the announced frame rate disagrees with the measured one by more
/// than 1%.
fn check_metadata(metadata: Option<&MetadataHints>, measured: Option<FrameRate>) {
    let (Some(announced), Some(measured)) = (metadata.and_then(|m| m.frame_rate), measured) else {
        return;
    };
    let measured = measured.as_f64();
    if ((announced - measured) / measured).abs() > 0.01 {
        debug!(announced, measured, "onMetaData frame rate differs from measured rate");
    }
}
