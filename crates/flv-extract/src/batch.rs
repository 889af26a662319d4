//! # Batch driver
//!
//! Runs the extraction over a list of files, one after the other, on a
//! dedicated worker thread. Each attempted file yields exactly one
//! [`FileReport`], delivered in input order over a channel. A [`StopFlag`]
//! checked before every file ends the batch early; the file in progress is
//! always finished.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, unbounded};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::ExtractConfig;
use crate::extractor::FlvExtractor;
use crate::overwrite::{OverwritePolicy, OverwritePrompt};
use crate::timing::FrameRate;

/// Cooperative cancellation shared between the worker and its controller.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Warning,
    Error,
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// File name without its directory
    pub display_name: String,
    pub path: PathBuf,
    pub status: FileStatus,
    pub true_frame_rate: Option<FrameRate>,
    pub average_frame_rate: Option<FrameRate>,
    /// Warnings joined by newlines, empty when there were none
    pub warnings_text: String,
    pub error_message: Option<String>,
    /// Debug rendering of the error
    pub error_detail: Option<String>,
}

/// Totals over one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub warned: usize,
    pub failed: usize,
    /// Whether the stop flag ended the batch before every file was processed
    pub stopped: bool,
}

impl BatchSummary {
    fn record(&mut self, status: FileStatus) {
        self.processed += 1;
        match status {
            FileStatus::Ok => self.succeeded += 1,
            FileStatus::Warning => self.warned += 1,
            FileStatus::Error => self.failed += 1,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn process_file(
    extractor: &FlvExtractor,
    path: &Path,
    policy: &mut OverwritePolicy,
    prompt: &mut dyn OverwritePrompt,
    stop: &StopFlag,
) -> FileReport {
    let mut confirm = |existing: &Path| policy.confirm(existing, prompt, stop);
    let display_name = display_name(path);

    match extractor.extract_streams(path, &mut confirm) {
        Ok(result) => FileReport {
            display_name,
            path: path.to_path_buf(),
            status: if result.has_warnings() {
                FileStatus::Warning
            } else {
                FileStatus::Ok
            },
            true_frame_rate: result.true_frame_rate,
            average_frame_rate: result.average_frame_rate,
            warnings_text: result.warnings.join("\n"),
            error_message: None,
            error_detail: None,
        },
        Err(e) => {
            error!(path = %path.display(), error = %e, "extraction failed");
            FileReport {
                display_name,
                path: path.to_path_buf(),
                status: FileStatus::Error,
                true_frame_rate: None,
                average_frame_rate: None,
                warnings_text: String::new(),
                error_message: Some(e.to_string()),
                error_detail: Some(format!("{e:?}")),
            }
        }
    }
}

/// Processes `paths` in order on the calling thread, handing each report to
/// `sink` as soon as the file is done.
///
/// `policy` is the overwrite behaviour the batch starts with; `prompt` is only
/// consulted while it is [`OverwritePolicy::Ask`].
pub fn run_batch(
    paths: &[PathBuf],
    config: &ExtractConfig,
    mut policy: OverwritePolicy,
    prompt: &mut dyn OverwritePrompt,
    stop: &StopFlag,
    sink: &mut dyn FnMut(FileReport),
) -> BatchSummary {
    let extractor = FlvExtractor::new(config.clone());
    let mut summary = BatchSummary {
        total: paths.len(),
        ..Default::default()
    };

    info!(files = paths.len(), ?policy, "{config}");

    for (index, path) in paths.iter().enumerate() {
        if stop.is_stopped() {
            warn!(remaining = paths.len() - index, "batch stopped");
            summary.stopped = true;
            break;
        }

        let report = process_file(&extractor, path, &mut policy, prompt, stop);
        summary.record(report.status);
        sink(report);
    }

    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        warned = summary.warned,
        failed = summary.failed,
        "batch finished"
    );
    summary
}

/// Spawns batch runs on a worker thread.
pub struct BatchExtractor;

impl BatchExtractor {
    /// Starts processing `paths` on a new thread.
    pub fn spawn<P>(
        paths: Vec<PathBuf>,
        config: ExtractConfig,
        policy: OverwritePolicy,
        prompt: P,
    ) -> std::io::Result<BatchHandle>
    where
        P: OverwritePrompt + 'static,
    {
        let stop = StopFlag::new();
        let (reports_tx, reports) = unbounded();

        let worker_stop = stop.clone();
        let worker = thread::Builder::new()
            .name("flvx-batch".to_string())
            .spawn(move || {
                let mut prompt = prompt;
                run_batch(&paths, &config, policy, &mut prompt, &worker_stop, &mut |report| {
                    // A dropped receiver only means nobody is listening
                    let _ = reports_tx.send(report);
                })
            })?;

        Ok(BatchHandle {
            stop,
            reports,
            worker,
        })
    }
}

/// Controls a running batch.
pub struct BatchHandle {
    stop: StopFlag,
    reports: Receiver<FileReport>,
    worker: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Asks the worker to stop before its next file.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Reports in input order. The channel disconnects when the worker ends.
    pub fn results(&self) -> &Receiver<FileReport> {
        &self.reports
    }

    /// Waits for the worker to finish.
    pub fn join(self) -> thread::Result<BatchSummary> {
        self.worker.join()
    }
}
