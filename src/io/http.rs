use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

const MAX_RETRY: u32 = 10;

/// HTTP Range reader for remote ZIP archives
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Create a new HTTP Range reader
    ///
    /// Sends a HEAD request to verify Range support and get the archive size
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let size = Self::fetch_length(&client, &url)
            .await
            .with_context(|| format!("cannot open {url}"))?;
        debug!(%url, size, "opened remote archive");

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    async fn fetch_length(client: &Client, url: &str) -> Result<u64> {
        let resp = client.head(url).send().await?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        ranged_length(resp.headers())
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Some((_, end)) = byte_range(offset, buf.len(), self.size) else {
            return Ok(0);
        };
        let expected_size = (end - offset + 1) as usize;

        let mut received = 0;
        let mut retry_count = 0;

        while received < expected_size {
            let current_start = offset + received as u64;
            let range = format!("bytes={current_start}-{end}");

            let result = self
                .client
                .get(&self.url)
                .header("Range", &range)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    let bytes = resp.bytes().await?;
                    if bytes.is_empty() {
                        bail!("Empty response for range {range}");
                    }
                    let chunk_len = bytes.len().min(expected_size - received);
                    buf[received..received + chunk_len].copy_from_slice(&bytes[..chunk_len]);
                    received += chunk_len;

                    self.transferred_bytes
                        .fetch_add(chunk_len as u64, Ordering::Relaxed);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= MAX_RETRY {
                        bail!("Max retries exceeded");
                    }
                    warn!(retry = retry_count, max = MAX_RETRY, error = %e, "connection error");
                    tokio::time::sleep(retry_delay(retry_count)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Archive length from a HEAD response, if the server serves byte ranges.
fn ranged_length(headers: &HeaderMap) -> Result<u64> {
    let accept_ranges = headers
        .get("accept-ranges")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    if !accept_ranges.contains("bytes") {
        bail!("Remote server does not support Range requests");
    }

    headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))
}

/// Inclusive byte range to request for a read of `len` bytes at `offset`.
///
/// Returns `None` when nothing is left to read; the end is clamped to the
/// last byte of the source.
fn byte_range(offset: u64, len: usize, size: u64) -> Option<(u64, u64)> {
    if len == 0 || offset >= size {
        return None;
    }
    let end = offset.saturating_add(len as u64 - 1).min(size - 1);
    Some((offset, end))
}

/// Back-off before retry number `attempt`.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(500 * u64::from(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ZipBuilder;
    use crate::zip::ZipArchive;
    use reqwest::header::HeaderValue;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn range_is_clamped_to_source() {
        assert_eq!(byte_range(0, 10, 100), Some((0, 9)));
        assert_eq!(byte_range(95, 10, 100), Some((95, 99)));
        assert_eq!(byte_range(99, 1, 100), Some((99, 99)));
        assert_eq!(byte_range(u64::MAX - 1, 10, u64::MAX), Some((u64::MAX - 1, u64::MAX - 1)));
    }

    #[test]
    fn nothing_to_read_past_end_or_into_empty_buffer() {
        assert_eq!(byte_range(100, 10, 100), None);
        assert_eq!(byte_range(150, 10, 100), None);
        assert_eq!(byte_range(0, 0, 100), None);
        assert_eq!(byte_range(0, 10, 0), None);
    }

    #[test]
    fn head_response_must_offer_byte_ranges() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("1234"));
        let err = ranged_length(&headers).unwrap_err();
        assert!(err.to_string().contains("does not support Range"));

        headers.insert("accept-ranges", HeaderValue::from_static("bytes"));
        assert_eq!(ranged_length(&headers).unwrap(), 1234);

        headers.remove("content-length");
        let err = ranged_length(&headers).unwrap_err();
        assert!(err.to_string().contains("Content-Length"));
    }

    #[test]
    fn retry_delay_grows_linearly() {
        assert_eq!(retry_delay(1), Duration::from_millis(500));
        assert_eq!(retry_delay(4), Duration::from_secs(2));
    }

    /// Serve `data` over plain HTTP/1.1 on a loopback port, one request per
    /// connection, and return its URL.
    async fn serve(data: Vec<u8>, accept_ranges: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let data = Arc::new(data);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let data = data.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = socket.read(&mut chunk).await.unwrap();
                        if n == 0 {
                            return;
                        }
                        request.extend_from_slice(&chunk[..n]);
                    }
                    let request = String::from_utf8_lossy(&request).to_ascii_lowercase();

                    let response = if request.starts_with("head ") {
                        format!(
                            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\naccept-ranges: {accept_ranges}\r\nconnection: close\r\n\r\n",
                            data.len()
                        )
                        .into_bytes()
                    } else {
                        let range = request
                            .lines()
                            .find_map(|line| line.strip_prefix("range: bytes="))
                            .unwrap();
                        let (start, end) = range.trim().split_once('-').unwrap();
                        let (start, end): (usize, usize) =
                            (start.parse().unwrap(), end.parse().unwrap());
                        let body = &data[start..=end];
                        let mut response = format!(
                            "HTTP/1.1 206 Partial Content\r\ncontent-length: {}\r\ncontent-range: bytes {start}-{end}/{}\r\nconnection: close\r\n\r\n",
                            body.len(),
                            data.len()
                        )
                        .into_bytes();
                        response.extend_from_slice(body);
                        response
                    };
                    socket.write_all(&response).await.unwrap();
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}/archive.zip")
    }

    #[tokio::test]
    async fn reads_ranges_and_counts_transfer() {
        let data: Vec<u8> = (0..=255).collect();
        let reader = HttpRangeReader::new(serve(data, "bytes").await).await.unwrap();
        assert_eq!(reader.size(), 256);

        let mut buf = [0u8; 8];
        assert_eq!(reader.read_at(10, &mut buf).await.unwrap(), 8);
        assert_eq!(buf, [10, 11, 12, 13, 14, 15, 16, 17]);

        // Reads past the end are clamped to the last byte
        assert_eq!(reader.read_at(252, &mut buf).await.unwrap(), 4);
        assert_eq!(&buf[..4], &[252, 253, 254, 255]);
        assert_eq!(reader.read_at(256, &mut buf).await.unwrap(), 0);

        assert_eq!(reader.transferred_bytes(), 12);
    }

    #[tokio::test]
    async fn refuses_servers_without_range_support() {
        let url = serve(vec![0; 64], "none").await;
        let err = HttpRangeReader::new(url).await.err().unwrap();
        assert!(format!("{err:#}").contains("does not support Range requests"));
    }

    #[tokio::test]
    async fn opens_remote_archive() {
        let data = ZipBuilder::new()
            .stored("A.txt", b"alpha")
            .deflated("B.txt", &b"bravo ".repeat(30))
            .finish();
        let reader = HttpRangeReader::new(serve(data, "bytes").await).await.unwrap();
        let archive = ZipArchive::open(Arc::new(reader)).await.unwrap();

        assert_eq!(archive.entries().len(), 2);
        assert_eq!(archive.read_entry(1).await.unwrap(), b"bravo ".repeat(30));
        archive.close().await.unwrap();
    }
}
