use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::Crc;
use flate2::read::DeflateDecoder;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::io::ReadAt;
use crate::select::EntryListing;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipEntry};

/// A ZIP archive opened read-only.
///
/// The central directory is read once at open time; entry indices follow
/// its order and stay valid until the archive is closed.
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Open an archive and read its central directory.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.read_central_directory().await?;
        debug!(entries = entries.len(), size = parser.size(), "archive opened");
        Ok(Self { parser, entries })
    }

    /// All entries in central directory order
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ZipEntry> {
        self.entries.get(index)
    }

    /// Read, decompress and verify the entry at `index`.
    ///
    /// # Errors
    ///
    /// Fails on unsupported or encrypted entries, truncated data, and
    /// length or CRC-32 mismatches.
    pub async fn read_entry(&self, index: usize) -> Result<Vec<u8>> {
        let Some(entry) = self.entries.get(index) else {
            bail!("no entry at index {index}");
        };

        if entry.is_encrypted() {
            bail!("encrypted entries are not supported");
        }

        let data_offset = self.parser.data_offset(entry).await?;
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > self.parser.size())
        {
            bail!("entry data extends past end of archive");
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_exact_at(data_offset, &mut raw).await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let mut out = Vec::new();
                // One byte past the expected size is enough to detect overlong data
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .context("invalid compressed data")?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!("unsupported compression method {method}")
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "bad length: expected {} bytes, got {}",
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("bad CRC {:08x} (should be {:08x})", crc.sum(), entry.crc32);
        }

        Ok(data)
    }

    /// Extract the entry at `index` to `output_path`.
    ///
    /// Directory entries create the directory; files create their parent
    /// directories as needed.
    pub async fn extract_to_file(&self, index: usize, output_path: &Path) -> Result<()> {
        let Some(entry) = self.entries.get(index) else {
            bail!("no entry at index {index}");
        };

        if entry.is_directory() {
            fs::create_dir_all(output_path).await?;
            return Ok(());
        }

        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let data = self.read_entry(index).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        Ok(())
    }

    /// Close the archive.
    ///
    /// # Errors
    ///
    /// Fails if the underlying source changed size while it was open,
    /// since entries read from it may be inconsistent.
    pub async fn close(self) -> Result<()> {
        let opened = self.parser.size();
        let now = self.parser.reader().current_size().await?;
        if now != opened {
            bail!("archive changed while open ({opened} bytes, now {now})");
        }
        debug!("archive closed");
        Ok(())
    }
}

impl<R: ReadAt> EntryListing for ZipArchive<R> {
    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn name_at(&self, index: usize) -> &[u8] {
        &self.entries[index].raw_name
    }
}
