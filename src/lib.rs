//! # zippick
//!
//! Select entries of a ZIP archive by exact name or shell glob, then list,
//! test or extract just those entries.
//!
//! Archives can be read from the local filesystem or from HTTP servers that
//! support Range requests; only the central directory and the selected
//! entries' data are fetched.
//!
//! ## Features
//!
//! - Entry selection with `fnmatch`-style globs (`*`, `?`, `[...]`)
//! - Reports names and patterns that matched nothing
//! - ZIP64 archives, STORED and DEFLATE entries, CRC-32 verification
//! - Local files and HTTP/HTTPS URLs
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zippick::{LocalFileReader, ZipArchive, select};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("roms.zip".as_ref())?);
//!     let archive = ZipArchive::open(reader).await?;
//!
//!     let selection = select(&archive, &["*.cue"])?;
//!     for token in selection.unmatched() {
//!         eprintln!("{}: no such entry", String::from_utf8_lossy(token));
//!     }
//!     for index in selection.members().iter() {
//!         println!("{}", archive.entries()[index].name);
//!     }
//!
//!     archive.close().await
//! }
//! ```

pub mod cli;
pub mod io;
pub mod ops;
pub mod select;
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
pub mod zip;

pub use cli::{Cli, RunMode};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use select::{EntryListing, MembershipSet, SelectError, Selection, select};
pub use zip::{ZipArchive, ZipEntry};
