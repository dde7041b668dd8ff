//! Problem records mapped from database page properties

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::page::Page;
use crate::error::NotionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// One exported write-up
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRecord {
    /// Page id, also the block container id for rendering
    pub page_id: String,
    /// Problem number
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub link: Option<String>,
    pub languages: Vec<String>,
    pub time: Option<String>,
    pub space: Option<String>,
    pub update: Option<String>,
}

impl ProblemRecord {
    pub fn from_page(page: &Page) -> Result<Self, NotionError> {
        let invalid = |reason: &str| NotionError::InvalidRecord {
            page_id: page.id.clone(),
            reason: reason.to_string(),
        };

        let id = page
            .property("ID")
            .and_then(number_of)
            .ok_or_else(|| invalid("ID is not a number"))?;

        let difficulty = match page
            .property("Difficulty")
            .and_then(|p| p.pointer("/select/name"))
            .and_then(Value::as_str)
        {
            Some(name) => name.parse::<Difficulty>().map_err(|e: String| invalid(&e))?,
            None => Difficulty::default(),
        };

        let slug = page
            .property("Slug")
            .and_then(|p| {
                first_rich_text(p).or_else(|| p.pointer("/formula/string").and_then(Value::as_str))
            })
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            page_id: page.id.clone(),
            id,
            title: page
                .property("Title")
                .and_then(|p| p.get("title"))
                .map(joined_plain_text)
                .unwrap_or_default(),
            slug,
            difficulty,
            tags: multi_select_names(page.property("Tags")),
            link: page
                .property("Link")
                .and_then(|p| p.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string),
            languages: multi_select_names(page.property("_Languages")),
            time: page.property("Time").and_then(first_rich_text).map(str::to_string),
            space: page.property("Space").and_then(first_rich_text).map(str::to_string),
            update: page
                .property("Update")
                .and_then(|p| p.pointer("/date/start"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Number property, or the number part of a unique-id property
fn number_of(property: &Value) -> Option<i64> {
    let number = property
        .get("number")
        .filter(|n| !n.is_null())
        .or_else(|| property.pointer("/unique_id/number"))
        .or(Some(property))?;
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn first_rich_text(property: &Value) -> Option<&str> {
    property.pointer("/rich_text/0/plain_text").and_then(Value::as_str)
}

fn joined_plain_text(runs: &Value) -> String {
    runs.as_array()
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

fn multi_select_names(property: Option<&Value>) -> Vec<String> {
    property
        .and_then(|p| p.get("multi_select"))
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Sort by problem number, highest first, and reject missing or repeated slugs
pub fn validate_records(
    mut records: Vec<ProblemRecord>,
) -> Result<Vec<ProblemRecord>, NotionError> {
    records.sort_by(|a, b| b.id.cmp(&a.id));

    let mut seen = HashSet::new();
    for record in &records {
        if record.slug.is_empty() {
            return Err(NotionError::MissingSlug {
                page_id: record.page_id.clone(),
            });
        }
        if !seen.insert(record.slug.as_str()) {
            return Err(NotionError::DuplicateSlug {
                slug: record.slug.clone(),
            });
        }
    }

    Ok(records)
}
