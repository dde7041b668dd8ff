//! Media materialization
//!
//! Remote images are downloaded next to the site's public assets so the
//! rendered document never links to short-lived hosted URLs. Files are named
//! by occurrence: `<container>/img-<n>.<ext>`, where `n` comes from the
//! [`ImageCounter`] owned by the document being rendered.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::DownloadError;

/// Public URL prefix under which materialized media is served
pub const PUBLIC_PREFIX: &str = "/notion";

const DEFAULT_EXTENSION: &str = "png";

static EXTENSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([A-Za-z0-9_]+)$").expect("valid extension regex"));

/// Retrieves remote bytes
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the body at `url`, failing on any non-success status
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError>;
}

/// [`RemoteFetcher`] backed by reqwest
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError> {
        let request_error = |source| DownloadError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.bytes().await.map_err(request_error)
    }
}

/// One materialized media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDownload {
    /// Where the bytes came from
    pub url: String,
    /// Site-relative path used in the document (`/notion/<id>/img-<n>.<ext>`)
    pub local_rel_path: String,
    /// Where the bytes were written
    pub local_abs_path: PathBuf,
}

/// Per-document occurrence counter for media file names.
///
/// Starts at zero; the first claimed index is 1.
#[derive(Debug, Default)]
pub struct ImageCounter {
    last: usize,
}

impl ImageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next occurrence index
    pub fn claim(&mut self) -> usize {
        self.last += 1;
        self.last
    }

    /// Number of indices handed out so far
    pub fn issued(&self) -> usize {
        self.last
    }
}

/// File extension of the URL's path, `png` when it has none
pub fn extension_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            EXTENSION_REGEX
                .captures(parsed.path())
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Downloads media into `<root>/<container>/img-<n>.<ext>`
#[derive(Clone)]
pub struct Materializer {
    root: PathBuf,
    fetcher: Arc<dyn RemoteFetcher>,
}

impl Materializer {
    /// `root` is the directory served at [`PUBLIC_PREFIX`]
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    /// Materializer over plain HTTP
    pub fn http(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::new(HttpFetcher::default()))
    }

    /// Download `url` as occurrence `index` of `container_id`.
    ///
    /// Writes exactly one file, creating parent directories as needed.
    pub async fn materialize(
        &self,
        container_id: &str,
        url: &str,
        index: usize,
    ) -> Result<MediaDownload, DownloadError> {
        let file_name = format!("img-{}.{}", index, extension_for(url));
        let local_rel_path = format!("{}/{}/{}", PUBLIC_PREFIX, container_id, file_name);
        let local_abs_path = self.root.join(container_id).join(&file_name);

        debug!("Materializing {} -> {:?}", url, local_abs_path);
        let bytes = self.fetcher.fetch(url).await?;

        let io_error = |source| DownloadError::Io {
            path: local_abs_path.clone(),
            source,
        };
        if let Some(parent) = local_abs_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(&local_abs_path, &bytes)
            .await
            .map_err(io_error)?;

        Ok(MediaDownload {
            url: url.to_string(),
            local_rel_path,
            local_abs_path,
        })
    }
}
