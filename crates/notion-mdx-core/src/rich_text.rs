//! Rich text runs as delivered by the block API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Style flags on a single run. Absent, `null` or mistyped flags read as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Annotations {
    #[serde(default, deserialize_with = "lenient")]
    pub bold: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub italic: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub strikethrough: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub underline: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub code: bool,
}

/// A run of text sharing one annotation set and an optional link target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RichText {
    #[serde(default, deserialize_with = "lenient")]
    pub plain_text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub annotations: Annotations,
    #[serde(default, deserialize_with = "lenient")]
    pub href: Option<String>,
}

impl RichText {
    /// Unstyled run
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Concatenate the raw text of every run, ignoring styles
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

/// Read a field that may be absent, `null` or of the wrong type; anything
/// unreadable becomes the default without failing the enclosing struct.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Runs of a rich-text array, skipping runs that can't be read.
/// `None` when `value` is not an array.
pub(crate) fn runs_from_value(value: Value) -> Option<Vec<RichText>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    }
}

/// `deserialize_with` form of [`runs_from_value`]; a non-array reads as empty
pub(crate) fn lenient_runs<'de, D>(deserializer: D) -> Result<Vec<RichText>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(runs_from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_run() {
        let json = r#"{
            "type": "text",
            "plain_text": "hi",
            "href": "https://example.com",
            "annotations": {"bold": true, "italic": false, "code": true, "color": "default"}
        }"#;
        let run: RichText = serde_json::from_str(json).unwrap();
        assert_eq!(run.plain_text, "hi");
        assert!(run.annotations.bold);
        assert!(run.annotations.code);
        assert!(!run.annotations.underline);
        assert_eq!(run.href.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_decode_missing_and_null_fields() {
        let run: RichText =
            serde_json::from_str(r#"{"plain_text": null, "annotations": null}"#).unwrap();
        assert_eq!(run, RichText::default());

        let run: RichText = serde_json::from_str(r#"{"annotations": {"bold": null}}"#).unwrap();
        assert!(!run.annotations.bold);
    }

    #[test]
    fn test_mistyped_fields_default_individually() {
        let run: RichText = serde_json::from_str(
            r#"{"plain_text": "x", "href": 7, "annotations": {"bold": "yes", "italic": true}}"#,
        )
        .unwrap();
        assert_eq!(run.plain_text, "x");
        assert_eq!(run.href, None);
        assert!(!run.annotations.bold);
        assert!(run.annotations.italic);

        let run: RichText =
            serde_json::from_str(r#"{"plain_text": 3, "annotations": []}"#).unwrap();
        assert_eq!(run, RichText::default());
    }

    #[test]
    fn test_runs_skip_unreadable_entries() {
        let runs = runs_from_value(serde_json::json!([
            {"plain_text": "keep me"},
            "not a run",
            {"plain_text": "x", "annotations": {"bold": "yes"}}
        ]))
        .unwrap();
        assert_eq!(runs, vec![RichText::plain("keep me"), RichText::plain("x")]);

        assert_eq!(runs_from_value(serde_json::json!("oops")), None);
    }

    #[test]
    fn test_plain_text_concatenates() {
        let runs = vec![RichText::plain("def "), RichText::plain("f():")];
        assert_eq!(plain_text(&runs), "def f():");
    }
}
