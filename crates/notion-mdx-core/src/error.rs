//! Error types
//!
//! Library boundaries return these typed errors; the CLI wraps them in anyhow.

use std::path::PathBuf;

use thiserror::Error;

/// Failure retrieving or storing a media file
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("[download] HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("[download] request failed for {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("[download] could not write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that aborts the rendering of a single document.
///
/// Child fetch failures never show up here - they degrade to "no children".
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Errors talking to the Notion API or interpreting its records
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("[notion] request failed")]
    Http(#[from] reqwest::Error),
    #[error("[notion] API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("[notion] unexpected response shape")]
    Decode(#[from] serde_json::Error),
    #[error(
        "[notion] database {database_id} has no accessible data sources for this integration. \
         Ensure the integration is shared and the database has at least one data source."
    )]
    NoDataSource { database_id: String },
    #[error("[notion] page {page_id}: {reason}")]
    InvalidRecord { page_id: String, reason: String },
    #[error("[notion] record {page_id} missing slug")]
    MissingSlug { page_id: String },
    #[error("[notion] duplicate slug: {slug}")]
    DuplicateSlug { slug: String },
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing {0} (set it in notion-mdx.toml or the environment)")]
    Missing(&'static str),
}
