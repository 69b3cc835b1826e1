//! HTTP access to the remote source.
//!
//! Every request is retried on transient failures with the crate's
//! exponential backoff. The `display_url` passed alongside each URL is the
//! redacted form used in logs and errors.

use std::path::Path;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::{debug, warn};
use reqwest::header::LAST_MODIFIED;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio_retry::RetryIf;

use crate::config::MAX_ARCHIVE_DOWNLOAD_SIZE;
use crate::error_handling::{
    categorize_reqwest_error, get_retry_strategy, status_error, UpdateError,
};

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    retries: usize,
    max_download_size: u64,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, retries: usize) -> Self {
        Self {
            client,
            retries,
            max_download_size: MAX_ARCHIVE_DOWNLOAD_SIZE,
        }
    }

    /// Overrides the archive size limit.
    pub fn with_max_download_size(mut self, bytes: u64) -> Self {
        self.max_download_size = bytes;
        self
    }

    /// `Last-Modified` of the resource, from a HEAD request.
    pub async fn last_modified(&self, url: &str, display_url: &str) -> Result<DateTime<Utc>, UpdateError> {
        RetryIf::spawn(
            get_retry_strategy(self.retries),
            || self.head_last_modified(url, display_url),
            |e: &UpdateError| retry_logged(e, display_url),
        )
        .await
    }

    async fn head_last_modified(&self, url: &str, display_url: &str) -> Result<DateTime<Utc>, UpdateError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(display_url, &e))?;
        if !response.status().is_success() {
            return Err(status_error(display_url, response.status()));
        }

        let header = response
            .headers()
            .get(LAST_MODIFIED)
            .ok_or_else(|| permanent(display_url, "missing Last-Modified header"))?;
        let text = header
            .to_str()
            .map_err(|_| permanent(display_url, "unreadable Last-Modified header"))?;
        DateTime::parse_from_rfc2822(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| permanent(display_url, format!("invalid Last-Modified '{}': {}", text, e)))
    }

    /// Body of a small text resource.
    pub async fn download_string(&self, url: &str, display_url: &str) -> Result<String, UpdateError> {
        RetryIf::spawn(
            get_retry_strategy(self.retries),
            || async move {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| categorize_reqwest_error(display_url, &e))?;
                if !response.status().is_success() {
                    return Err(status_error(display_url, response.status()));
                }
                response
                    .text()
                    .await
                    .map_err(|e| categorize_reqwest_error(display_url, &e))
            },
            |e: &UpdateError| retry_logged(e, display_url),
        )
        .await
    }

    /// Streams the resource into `target` and returns its lowercase hex SHA-256.
    ///
    /// A partially written file is removed when the download fails.
    pub async fn download_to_file(
        &self,
        url: &str,
        display_url: &str,
        target: &Path,
    ) -> Result<String, UpdateError> {
        let result = RetryIf::spawn(
            get_retry_strategy(self.retries),
            || self.stream_to_file(url, display_url, target),
            |e: &UpdateError| retry_logged(e, display_url),
        )
        .await;

        if result.is_err() {
            remove_partial(target).await;
        }
        result
    }

    async fn stream_to_file(&self, url: &str, display_url: &str, target: &Path) -> Result<String, UpdateError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(display_url, &e))?;
        if !response.status().is_success() {
            return Err(status_error(display_url, response.status()));
        }
        if let Some(length) = response.content_length() {
            if length > self.max_download_size {
                return Err(too_large(display_url, self.max_download_size));
            }
        }

        let mut file = tokio::fs::File::create(target).await?;
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| categorize_reqwest_error(display_url, &e))?;
            downloaded += chunk.len() as u64;
            if downloaded > self.max_download_size {
                return Err(too_large(display_url, self.max_download_size));
            }
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
        }
        file.flush().await?;

        debug!(
            "Downloaded {} ({:.2} MB)",
            display_url,
            downloaded as f64 / (1024.0 * 1024.0)
        );
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn retry_logged(error: &UpdateError, display_url: &str) -> bool {
    let retry = error.is_retriable();
    if retry {
        warn!("Retrying {} after transient failure: {}", display_url, error);
    }
    retry
}

fn permanent(display_url: &str, reason: impl Into<String>) -> UpdateError {
    UpdateError::Transport {
        url: display_url.to_string(),
        reason: reason.into(),
        retriable: false,
    }
}

fn too_large(display_url: &str, limit: u64) -> UpdateError {
    permanent(display_url, format!("archive exceeds {} bytes", limit))
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial download {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial download {}: {}", path.display(), e),
    }
}
