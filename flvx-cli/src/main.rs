use clap::Parser;
use crossbeam_channel::{Receiver, select};
use error::AppError;
use flv_extract::{BatchExtractor, BatchHandle, ForegroundPrompt, PromptRequest};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod error;
mod inputs;
mod output;
mod prompt;

use cli::CliArgs;
use output::Reporter;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

fn install_logging<W>(level: Level, writer: W, ansi: bool) -> Result<(), AppError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(ansi)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))
}

fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Logs go to stderr, stdout carries the reports
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match &args.log_file {
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            let multi_writer = MakeWriterExt::and(std::io::stderr, log_file);
            install_logging(log_level, multi_writer, false)?;
        }
        None => install_logging(log_level, std::io::stderr, true)?,
    }

    let files = inputs::collect_inputs(&args.input)?;
    let config = args.extract_config();
    info!("{config}");
    info!(files = files.len(), "starting batch");

    let total = files.len();
    // With -y or -n the prompt is never consulted
    let (prompt, requests) = ForegroundPrompt::new();
    let handle = BatchExtractor::spawn(files, config, args.overwrite_policy(), prompt)?;

    let mut reporter = Reporter::new(total, args.json)?;
    drive(&handle, requests, &mut reporter)?;

    let summary = handle.join().map_err(|_| AppError::WorkerPanicked)?;
    reporter.finish(&summary);

    if summary.failed > 0 {
        return Err(AppError::FilesFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

/// Pumps reports and overwrite questions until the worker is done.
fn drive(
    handle: &BatchHandle,
    requests: Receiver<PromptRequest>,
    reporter: &mut Reporter,
) -> Result<(), AppError> {
    loop {
        select! {
            recv(handle.results()) -> report => match report {
                Ok(report) => reporter.on_report(report)?,
                Err(_) => return Ok(()),
            },
            recv(requests) -> request => match request {
                Ok(request) => {
                    let decision = reporter.suspend(|| prompt::ask(request.path()));
                    debug!(path = %request.path().display(), ?decision, "answered overwrite prompt");
                    request.answer(decision);
                }
                // The worker dropped its prompt, only reports are left
                Err(_) => break,
            },
        }
    }

    for report in handle.results().iter() {
        reporter.on_report(report)?;
    }
    Ok(())
}
