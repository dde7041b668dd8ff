//! Database page rows

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::rich_text::lenient;

/// A file reference as used by covers and file properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileRef {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub external: Option<UrlHolder>,
    #[serde(default)]
    pub file: Option<UrlHolder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UrlHolder {
    #[serde(default)]
    pub url: String,
}

impl FileRef {
    /// URL of the variant named by `type`
    pub fn url(&self) -> Option<&str> {
        let holder = match self.kind.as_str() {
            "external" => self.external.as_ref(),
            "file" => self.file.as_ref(),
            _ => None,
        }?;
        Some(holder.url.as_str()).filter(|url| !url.is_empty())
    }
}

/// One row of a data source query
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub cover: Option<FileRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub properties: Map<String, Value>,
}

impl Page {
    pub fn cover_url(&self) -> Option<&str> {
        self.cover.as_ref().and_then(FileRef::url)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }
}
