use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};
use tracing::debug;

use crate::io::ReadAt;
use crate::select::MembershipSet;
use crate::zip::{ZipArchive, ZipEntry};

/// What to do when an output file already exists
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Skip the entry and suggest `-o`
    #[default]
    Skip,
    /// Replace the file (`-o`)
    Always,
    /// Skip the entry without a hint (`-n`)
    Never,
}

/// Settings for extract mode.
#[derive(Debug, Default, Clone)]
pub struct ExtractOptions {
    /// Destination directory, current directory when unset
    pub dest: Option<PathBuf>,
    pub overwrite: Overwrite,
    /// Drop directory components from entry names
    pub junk_paths: bool,
    /// Suppress per-entry progress lines
    pub quiet: bool,
}

/// Outcome of extracting the selected entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    pub extracted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExtractReport {
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Extract every selected entry.
///
/// Progress goes to `out`; skips and per-entry failures go to `err`.
/// A failing entry does not stop the remaining ones.
pub async fn extract<R: ReadAt, W: Write, E: Write>(
    archive: &ZipArchive<R>,
    selected: &MembershipSet,
    options: &ExtractOptions,
    out: &mut W,
    err: &mut E,
) -> Result<ExtractReport> {
    let mut report = ExtractReport::default();

    for index in selected.iter() {
        let Some(entry) = archive.entry(index) else {
            continue;
        };

        // With junked paths, directories have nothing left to create
        if options.junk_paths && entry.is_directory() {
            continue;
        }

        let output_path = match output_path(stored_path(entry), options) {
            Ok(path) => path,
            Err(e) => {
                writeln!(err, "error: {}: {e}", entry.name)?;
                report.failed += 1;
                continue;
            }
        };

        if !entry.is_directory() && output_path.exists() {
            match options.overwrite {
                Overwrite::Never => {
                    report.skipped += 1;
                    continue;
                }
                Overwrite::Skip => {
                    if !options.quiet {
                        writeln!(err, "Skipping: {} (use -o to overwrite)", entry.name)?;
                    }
                    report.skipped += 1;
                    continue;
                }
                Overwrite::Always => {}
            }
        }

        if !options.quiet {
            let action = if entry.is_directory() { "   creating" } else { "  extracting" };
            writeln!(out, "{action}: {}", entry.name)?;
        }

        match archive.extract_to_file(index, &output_path).await {
            Ok(()) => report.extracted += 1,
            Err(e) => {
                debug!(index, path = %output_path.display(), error = %e, "extraction failed");
                writeln!(err, "error: {}: {e:#}", entry.name)?;
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// The entry name as a path, keeping bytes that are not valid UTF-8.
#[cfg(unix)]
fn stored_path(entry: &ZipEntry) -> &Path {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Path::new(OsStr::from_bytes(&entry.raw_name))
}

#[cfg(not(unix))]
fn stored_path(entry: &ZipEntry) -> &Path {
    Path::new(&entry.name)
}

/// Map an entry name to a path under the destination.
///
/// Names that are absolute or climb out with `..` are refused.
fn output_path(name: impl AsRef<Path>, options: &ExtractOptions) -> Result<PathBuf> {
    let relative = name.as_ref();
    let mut cleaned = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("refusing to extract outside the destination directory")
            }
        }
    }

    if options.junk_paths
        && let Some(file_name) = cleaned.file_name()
    {
        cleaned = PathBuf::from(file_name);
    }

    if cleaned.as_os_str().is_empty() {
        bail!("empty entry name");
    }

    Ok(match &options.dest {
        Some(dir) => dir.join(cleaned),
        None => cleaned,
    })
}
