//! Streaming asset download with progress and cooperative cancellation
//!
//! The asset is written to a side-by-side file next to the running
//! executable (e.g. `MyApp.update.exe`). The response body is re-buffered
//! into fixed-size chunks; after every chunk is written a progress
//! notification is emitted and the cancellation token is checked. A
//! cancelled download leaves its partial file in place for later cleanup.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};
use crate::progress::{PercentTracker, ProgressModel, ProgressReporter, CANCELLED_CAPTION};
use crate::releases::UpdateInfo;

/// Default chunk size for downloading (256 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// A completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Name of the release asset
    pub asset_name: String,

    /// Absolute path of the written file
    pub path: PathBuf,

    /// Bytes written
    pub bytes: u64,
}

/// Result of a download that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed(DownloadedFile),
    Cancelled,
}

/// Streams release assets to disk
#[derive(Debug, Clone)]
pub struct DownloadPipeline {
    /// Shared HTTP client owned by the engine
    client: reqwest::Client,

    chunk_size: usize,

    /// Upper bound for the whole transfer
    timeout: Duration,
}

impl DownloadPipeline {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(600),
        }
    }

    /// Set the chunk size; zero is treated as one byte
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Download `info.uri` into `destination`.
    ///
    /// Cancellation is observed once the response headers arrive and after
    /// each chunk write, never in the middle of a chunk.
    pub async fn download(
        &self,
        info: &UpdateInfo,
        destination: &Path,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        info!("Downloading {} to {}", info.uri, destination.display());

        let response = self
            .client
            .get(info.uri.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status,
                uri: info.uri.to_string(),
            });
        }

        let mut writer = ChunkWriter::create(destination, response.content_length())?;
        progress.report(ProgressModel::updating(
            writer.tracker.caption(0),
            writer.tracker.percent(0),
        ));

        if cancel.is_cancelled() {
            return Ok(writer.cancelled(progress));
        }

        let mut buffer: Vec<u8> = Vec::with_capacity(self.chunk_size);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk?;
            buffer.extend_from_slice(&chunk);

            while buffer.len() >= self.chunk_size {
                writer.write(&buffer[..self.chunk_size], progress)?;
                buffer.drain(..self.chunk_size);

                if cancel.is_cancelled() {
                    return Ok(writer.cancelled(progress));
                }
            }
        }

        if !buffer.is_empty() {
            writer.write(&buffer, progress)?;
            if cancel.is_cancelled() {
                return Ok(writer.cancelled(progress));
            }
        }

        let bytes = writer.finish()?;
        progress.report(ProgressModel::done("Download complete"));
        info!("Downloaded {} ({} bytes)", info.name, bytes);

        Ok(DownloadOutcome::Completed(DownloadedFile {
            asset_name: info.name.clone(),
            path: destination.to_path_buf(),
            bytes,
        }))
    }
}

/// Destination file plus byte accounting
struct ChunkWriter {
    file: File,
    path: PathBuf,
    downloaded: u64,
    tracker: PercentTracker,
}

impl ChunkWriter {
    fn create(path: &Path, total: Option<u64>) -> Result<Self> {
        let file = File::create(path).map_err(|e| UpdateError::io(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            downloaded: 0,
            tracker: PercentTracker::new(total),
        })
    }

    fn write(&mut self, chunk: &[u8], progress: &dyn ProgressReporter) -> Result<()> {
        self.file
            .write_all(chunk)
            .map_err(|e| UpdateError::io(&self.path, e))?;
        self.downloaded += chunk.len() as u64;

        let percent = self.tracker.percent(self.downloaded);
        progress.report(ProgressModel::updating(
            self.tracker.caption(self.downloaded),
            percent,
        ));
        Ok(())
    }

    fn cancelled(mut self, progress: &dyn ProgressReporter) -> DownloadOutcome {
        // Partial content is left for the cleanup step
        let _ = self.file.flush();
        debug!(
            "Download cancelled after {} bytes, partial file at {}",
            self.downloaded,
            self.path.display()
        );
        progress.report(ProgressModel::ready(CANCELLED_CAPTION, self.tracker.last()));
        DownloadOutcome::Cancelled
    }

    fn finish(mut self) -> Result<u64> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_all())
            .map_err(|e| UpdateError::io(&self.path, e))?;
        Ok(self.downloaded)
    }
}

/// Side-by-side path a download for `executable` is written to
pub fn artifact_path(executable: &Path, artifact_name: &str) -> PathBuf {
    match executable.parent() {
        Some(dir) => dir.join(artifact_name),
        None => PathBuf::from(artifact_name),
    }
}
