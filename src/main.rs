//! Main entry point for the zippick CLI application.
//!
//! Opens a ZIP archive from the local filesystem or an HTTP URL, selects
//! entries from the remaining arguments, and runs the requested mode on
//! them.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use zippick::cli::PROGNAME;
use zippick::{Cli, HttpRangeReader, LocalFileReader, ReadAt, RunMode, ZipArchive, ops, select};

/// Environment variable holding the log filter, e.g. `ZIPPICK_LOG=debug`
const LOG_ENV: &str = "ZIPPICK_LOG";

/// Application entry point.
///
/// Exit status is 0 on success, help and version output, and 1 for any
/// fatal error or failed test/extract run.
#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version are printed to stdout and are not failures
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{PROGNAME}: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Dispatch on the archive source, returning whether the run succeeded.
async fn run(cli: &Cli) -> Result<bool> {
    let mode = cli.run_mode()?;

    if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone()).await?);
        let ok = process_zip(reader.clone(), cli, mode).await?;

        // Display network transfer statistics for HTTP sources
        if !cli.quiet {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
        Ok(ok)
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        process_zip(reader, cli, mode).await
    }
}

/// Open the archive, select entries and run `mode` on them.
///
/// Tokens matching nothing are reported but do not fail the run.
async fn process_zip<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli, mode: RunMode) -> Result<bool> {
    let archive = ZipArchive::open(reader)
        .await
        .with_context(|| format!("cannot open zip archive '{}'", cli.file))?;

    let selection = select(&archive, &cli.tokens())?;
    for token in selection.unmatched() {
        eprintln!(
            "{PROGNAME}: {}: no such entry in archive",
            String::from_utf8_lossy(token)
        );
    }
    let selected = selection.into_members();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let ok = match mode {
        RunMode::List => {
            ops::list(&archive, &selected, &cli.file, &mut out)?;
            true
        }
        RunMode::Test => {
            ops::test(&archive, &selected, &cli.file, &mut out)
                .await?
                .is_ok()
        }
        RunMode::Extract => {
            let options = cli.extract_options();
            ops::extract(&archive, &selected, &options, &mut out, &mut io::stderr())
                .await?
                .is_ok()
        }
    };
    out.flush()?;

    archive
        .close()
        .await
        .with_context(|| format!("cannot close zip archive '{}'", cli.file))?;

    Ok(ok)
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
