//! Helpers for building small ZIP archives in memory.
//!
//! Used by unit and integration tests. Only built for tests or with the
//! `test-utils` feature; not part of the supported API.
//!
//! # Panics
//!
//! Functions in this module panic on I/O errors since they only write
//! to memory.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use crate::zip::{CDFH_SIGNATURE, EndOfCentralDirectory, LFH_SIGNATURE};

/// 2019-09-08 05:45:00 in DOS format
const DOS_TIME: u16 = (5 << 11) | (45 << 5);
const DOS_DATE: u16 = ((2019 - 1980) << 9) | (9 << 5) | 8;

struct PendingEntry {
    name: Vec<u8>,
    method: u16,
    crc32: u32,
    uncompressed_size: u32,
    payload: Vec<u8>,
}

/// Builder for in-memory ZIP archives.
///
/// # Examples
///
/// ```ignore
/// use zippick::test_utils::ZipBuilder;
///
/// let zip = ZipBuilder::new()
///     .stored("a.txt", b"hello")
///     .deflated("b.txt", b"world")
///     .finish();
/// ```
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<PendingEntry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncompressed entry.
    #[must_use]
    pub fn stored(self, name: impl AsRef<[u8]>, data: &[u8]) -> Self {
        let crc = crc32(data);
        self.stored_with_crc(name, data, crc)
    }

    /// Add an uncompressed entry whose recorded CRC-32 is `crc`.
    #[must_use]
    pub fn stored_with_crc(mut self, name: impl AsRef<[u8]>, data: &[u8], crc: u32) -> Self {
        self.entries.push(PendingEntry {
            name: name.as_ref().to_vec(),
            method: 0,
            crc32: crc,
            uncompressed_size: data.len() as u32,
            payload: data.to_vec(),
        });
        self
    }

    /// Add a DEFLATE-compressed entry.
    #[must_use]
    pub fn deflated(mut self, name: impl AsRef<[u8]>, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        self.entries.push(PendingEntry {
            name: name.as_ref().to_vec(),
            method: 8,
            crc32: crc32(data),
            uncompressed_size: data.len() as u32,
            payload: encoder.finish().unwrap(),
        });
        self
    }

    /// Add an entry with a compression method the reader does not support.
    #[must_use]
    pub fn with_method(mut self, name: impl AsRef<[u8]>, method: u16, payload: &[u8]) -> Self {
        self.entries.push(PendingEntry {
            name: name.as_ref().to_vec(),
            method,
            crc32: 0,
            uncompressed_size: payload.len() as u32,
            payload: payload.to_vec(),
        });
        self
    }

    /// Add a directory entry; `name` should end with `/`.
    #[must_use]
    pub fn directory(self, name: impl AsRef<[u8]>) -> Self {
        self.stored(name, b"")
    }

    /// Set the archive comment.
    #[must_use]
    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Serialize the archive.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            offsets.push(out.len() as u32);
            out.write_all(LFH_SIGNATURE).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(entry.crc32).unwrap();
            out.write_u32::<LittleEndian>(entry.payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_all(&entry.name).unwrap();
            out.write_all(&entry.payload).unwrap();
        }

        let cd_offset = out.len() as u32;
        for (entry, offset) in self.entries.iter().zip(offsets) {
            out.write_all(CDFH_SIGNATURE).unwrap();
            out.write_u16::<LittleEndian>(0x031E).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(entry.crc32).unwrap();
            out.write_u32::<LittleEndian>(entry.payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0o100644 << 16).unwrap();
            out.write_u32::<LittleEndian>(offset).unwrap();
            out.write_all(&entry.name).unwrap();
        }
        let cd_size = out.len() as u32 - cd_offset;

        let count = self.entries.len() as u16;
        out.write_all(EndOfCentralDirectory::SIGNATURE).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.write_all(&self.comment).unwrap();
        out
    }
}

/// CRC-32 of `data`, as stored in ZIP headers.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}
