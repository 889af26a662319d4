use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use flv_extract::{BatchSummary, FileReport, FileStatus, FrameRate};

use crate::error::AppError;

fn batch_style() -> Result<ProgressStyle, AppError> {
    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/white}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=> "))
        .map_err(|e| AppError::Initialization(e.to_string()))
}

fn short_rate(rate: Option<FrameRate>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |rate| rate.to_string())
}

fn detailed_rate(rate: Option<FrameRate>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |rate| format!("{rate:#}"))
}

/// One line per file, followed by its warnings or error, indented.
pub fn report_line(report: &FileReport) -> String {
    let status = match report.status {
        FileStatus::Ok => "ok",
        FileStatus::Warning => "warn",
        FileStatus::Error => "FAIL",
    };
    let mut line = format!(
        "[{status:>4}] {}  true: {}  average: {}",
        report.display_name,
        short_rate(report.true_frame_rate),
        short_rate(report.average_frame_rate)
    );

    if let Some(message) = &report.error_message {
        line.push_str(&format!("\n       {message}"));
    }
    for warning in report.warnings_text.lines() {
        line.push_str(&format!("\n       {warning}"));
    }
    line
}

/// The frame-rate block printed once the batch is over. Failed files and
/// files without any rate are left out.
pub fn summary_block(reports: &[FileReport], summary: &BatchSummary) -> String {
    let mut block = String::new();
    let with_rates = reports.iter().filter(|r| {
        r.status != FileStatus::Error && (r.true_frame_rate.is_some() || r.average_frame_rate.is_some())
    });
    for report in with_rates {
        block.push_str(&format!("File: {}\n", report.display_name));
        block.push_str(&format!(
            "Estimated True Frame Rate: {}\n",
            detailed_rate(report.true_frame_rate)
        ));
        block.push_str(&format!(
            "Average Frame Rate: {}\n\n",
            detailed_rate(report.average_frame_rate)
        ));
    }

    block.push_str(&format!(
        "{} of {} file(s) processed: {} ok, {} with warnings, {} failed",
        summary.processed, summary.total, summary.succeeded, summary.warned, summary.failed
    ));
    if summary.stopped {
        block.push_str(" (stopped)");
    }
    block
}

/// Renders reports either as human readable progress or as JSON lines.
pub struct Reporter {
    bar: ProgressBar,
    json: bool,
    reports: Vec<FileReport>,
}

impl Reporter {
    pub fn new(total: usize, json: bool) -> Result<Self, AppError> {
        let bar = if json {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(batch_style()?);
            bar
        };
        Ok(Self {
            bar,
            json,
            reports: Vec::new(),
        })
    }

    /// Runs `f` with the progress bar cleared, for terminal interaction.
    pub fn suspend<T>(&self, f: impl FnOnce() -> T) -> T {
        self.bar.suspend(f)
    }

    pub fn on_report(&mut self, report: FileReport) -> Result<(), AppError> {
        if self.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            self.bar.println(report_line(&report));
            self.bar.set_message(report.display_name.clone());
        }
        self.bar.inc(1);
        self.reports.push(report);
        Ok(())
    }

    pub fn finish(self, summary: &BatchSummary) {
        self.bar.finish_and_clear();
        if !self.json {
            println!("{}", summary_block(&self.reports, summary));
        }
    }
}
