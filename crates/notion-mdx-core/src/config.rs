//! Exporter configuration
//!
//! Read from `notion-mdx.toml` in the project root when present; the
//! `NOTION_TOKEN` and `NOTION_DATABASE_ID` environment variables override
//! the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::writer::ContentDirs;

pub const CONFIG_FILE_NAME: &str = "notion-mdx.toml";

pub const TOKEN_ENV: &str = "NOTION_TOKEN";
pub const DATABASE_ID_ENV: &str = "NOTION_DATABASE_ID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub notion: NotionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub token: String,
    /// Database id, or a data source id (`ntn_` prefix)
    pub database_id: String,
    pub api_version: String,
    pub base_url: String,
    pub page_size: u32,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            database_id: String::new(),
            api_version: "2025-09-03".to_string(),
            base_url: "https://api.notion.com".to_string(),
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub content_dir: PathBuf,
    pub public_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("src/content/leetcode"),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Config {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or `<root>/notion-mdx.toml` if it exists, then apply the
    /// environment. An explicit path must exist.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (root.join(CONFIG_FILE_NAME), false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path)?,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override values from `lookup`; empty values are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key| lookup(key).filter(|v: &String| !v.trim().is_empty());

        if let Some(token) = non_empty(TOKEN_ENV) {
            self.notion.token = token;
        }
        if let Some(id) = non_empty(DATABASE_ID_ENV) {
            self.notion.database_id = id;
        }
    }

    /// Check the values a sync needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notion.token.is_empty() {
            return Err(ConfigError::Missing(TOKEN_ENV));
        }
        if self.notion.database_id.is_empty() {
            return Err(ConfigError::Missing(DATABASE_ID_ENV));
        }
        Ok(())
    }

    pub fn content_dirs(&self, root: &Path) -> ContentDirs {
        ContentDirs::new(root, &self.output.content_dir, &self.output.public_dir)
    }
}
