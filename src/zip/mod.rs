//! ZIP archive reading.
//!
//! The module is organized into three components:
//!
//! - [`structures`]: Data structures for ZIP format records (EOCD, headers, entries)
//! - [`parser`]: Low-level parsing of those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`archive`]: An opened archive with entry lookup and decompression
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for archives and entries over 4GB
//! - STORED and DEFLATE compression methods
//! - CRC-32 verification of decompressed data
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod archive;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use parser::ZipParser;
pub use structures::*;
