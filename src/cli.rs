use anyhow::{Result, bail};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::ops::{ExtractOptions, Overwrite};

/// Program name used as the prefix of error messages
pub const PROGNAME: &str = env!("CARGO_PKG_NAME");

/// Operation to run on the selected entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Extract,
    List,
    Test,
}

#[derive(Parser, Debug)]
#[command(name = "zippick")]
#[command(version)]
#[command(about = "Select ZIP archive entries by name or glob pattern, then list, test or extract them", long_about = None)]
#[command(after_help = "Entries are selected by exact name or by shell glob (*, ?, [...]).\n\
  With no names given, the whole archive is selected.\n\n\
Examples:\n  \
  zippick -l roms.zip '*.cue'             list the cue sheets in roms.zip\n  \
  zippick -t roms.zip                     test every entry of roms.zip\n  \
  zippick -d out roms.zip 'Track [1-3]*'  extract three tracks into out/")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub file: String,

    /// Entry names or glob patterns to select (default: all)
    #[arg(value_name = "NAME")]
    pub files: Vec<OsString>,

    /// List selected entries
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Test selected entries
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Extract files into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Never overwrite existing files
    #[arg(short = 'n', conflicts_with = "overwrite")]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    /// Selection tokens as the bytes the shell passed in.
    pub fn tokens(&self) -> Vec<&[u8]> {
        self.files.iter().map(|t| t.as_encoded_bytes()).collect()
    }

    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    /// The single run mode requested on the command line.
    ///
    /// # Errors
    ///
    /// Fails when more than one mode flag was given.
    pub fn run_mode(&self) -> Result<RunMode> {
        match (self.list, self.test) {
            (true, true) => bail!("only one mode selection allowed (none, -l, -t)"),
            (true, false) => Ok(RunMode::List),
            (false, true) => Ok(RunMode::Test),
            (false, false) => Ok(RunMode::Extract),
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        let overwrite = if self.overwrite {
            Overwrite::Always
        } else if self.never_overwrite {
            Overwrite::Never
        } else {
            Overwrite::Skip
        };

        ExtractOptions {
            dest: self.extract_dir.clone(),
            overwrite,
            junk_paths: self.junk_paths,
            quiet: self.quiet,
        }
    }
}
