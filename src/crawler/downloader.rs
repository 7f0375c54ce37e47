//! PDF asset downloads
//!
//! Fetches binary assets through the shared [`Fetcher`] and writes each one
//! into the download folder.

use crate::config::AssetNaming;
use crate::crawler::extractor::fingerprint;
use crate::crawler::fetcher::Fetcher;
use crate::events::{CrawlEvent, SharedObserver};
use crate::url::url_basename;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while downloading one asset
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no content after retries")]
    Fetch,

    #[error("download cancelled")]
    Cancelled,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes fetched assets into a folder
pub struct AssetDownloader {
    fetcher: Fetcher,
    folder: PathBuf,
    naming: AssetNaming,
    observer: SharedObserver,
}

impl AssetDownloader {
    /// Creates a downloader writing into `folder`
    ///
    /// The folder must already exist.
    pub fn new(
        fetcher: Fetcher,
        folder: impl Into<PathBuf>,
        naming: AssetNaming,
        observer: SharedObserver,
    ) -> Self {
        Self {
            fetcher,
            folder: folder.into(),
            naming,
            observer,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Downloads one asset, returning the written path
    ///
    /// An existing file with the same name is overwritten.
    pub async fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let result = self.try_download(url).await;

        match &result {
            Ok((path, bytes)) => self.observer.on_event(&CrawlEvent::AssetDownloaded {
                url: url.to_string(),
                path: path.clone(),
                bytes: *bytes,
            }),
            Err(DownloadError::Cancelled) => {}
            Err(e) => self.observer.on_event(&CrawlEvent::AssetFailed {
                url: url.to_string(),
                cause: e.to_string(),
            }),
        }

        result.map(|(path, _)| path)
    }

    async fn try_download(&self, url: &str) -> Result<(PathBuf, usize), DownloadError> {
        let bytes = match self.fetcher.fetch_binary(url).await {
            Some(bytes) => bytes,
            None if self.fetcher.is_cancelled() => return Err(DownloadError::Cancelled),
            None => return Err(DownloadError::Fetch),
        };

        let path = self.folder.join(asset_file_name(url, &bytes, self.naming));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| DownloadError::Write {
                path: path.clone(),
                source,
            })?;

        Ok((path, bytes.len()))
    }
}

/// File name for a downloaded asset
///
/// `Basename` uses the last path segment of the URL and falls back to the
/// content hash when the URL has none.
pub fn asset_file_name(url: &str, bytes: &[u8], naming: AssetNaming) -> String {
    let hashed = || format!("{}.pdf", hex::encode(fingerprint(bytes)));

    match naming {
        AssetNaming::Basename => url_basename(url).unwrap_or_else(hashed),
        AssetNaming::ContentHash => hashed(),
    }
}
