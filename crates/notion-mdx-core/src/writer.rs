//! Content directories and MDX document files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::media::PUBLIC_PREFIX;
use crate::notion::{Difficulty, ProblemRecord};

/// Front matter keys, in output order. Absent values are left out.
#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    id: i64,
    title: &'a str,
    slug: &'a str,
    difficulty: Difficulty,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    languages: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    space: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<&'a str>,
}

impl<'a> From<&'a ProblemRecord> for FrontMatter<'a> {
    fn from(record: &'a ProblemRecord) -> Self {
        Self {
            id: record.id,
            title: &record.title,
            slug: &record.slug,
            difficulty: record.difficulty,
            tags: &record.tags,
            link: record.link.as_deref(),
            languages: &record.languages,
            time: record.time.as_deref(),
            space: record.space.as_deref(),
            update: record.update.as_deref(),
        }
    }
}

/// Serialize `record` as front matter followed by `body`
pub fn format_document(record: &ProblemRecord, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(&FrontMatter::from(record))
        .with_context(|| format!("Failed to serialize front matter for {}", record.slug))?;

    let mut document = format!("---\n{}---\n{}", yaml, body);
    if !document.ends_with('\n') {
        document.push('\n');
    }
    Ok(document)
}

/// Where documents and media are written
#[derive(Debug, Clone)]
pub struct ContentDirs {
    pub content_dir: PathBuf,
    /// Root for materialized media; maps to the `/notion` site prefix
    pub media_dir: PathBuf,
}

impl ContentDirs {
    /// Resolve `content_dir` and `<public_dir>/notion` against `root`
    pub fn new(root: &Path, content_dir: &Path, public_dir: &Path) -> Self {
        Self {
            content_dir: root.join(content_dir),
            media_dir: root
                .join(public_dir)
                .join(PUBLIC_PREFIX.trim_start_matches('/')),
        }
    }

    /// Remove previously generated documents, leaving any other files alone
    pub async fn clear_documents(&self) -> Result<usize> {
        let mut entries = match fs::read_dir(&self.content_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {}", self.content_dir.display())
                })
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "mdx") {
                fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                removed += 1;
            }
        }

        debug!("Removed {} documents from {}", removed, self.content_dir.display());
        Ok(removed)
    }

    pub async fn ensure(&self) -> Result<()> {
        for dir in [&self.content_dir, &self.media_dir] {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// Write `<content_dir>/<slug>.mdx`, returning its path
    pub async fn write_document(&self, record: &ProblemRecord, body: &str) -> Result<PathBuf> {
        let document = format_document(record, body)?;
        let path = self.content_dir.join(format!("{}.mdx", record.slug));

        fs::create_dir_all(&self.content_dir).await?;
        fs::write(&path, document)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}
