//! Block tree model
//!
//! Blocks arrive as JSON objects of the shape
//! `{ "id", "type": "<kind>", "has_children", "<kind>": { ...payload } }`.
//! Decoding folds that into the closed [`BlockKind`] union; kinds we don't
//! know land in [`BlockKind::Unsupported`] with whatever rich text they carry.
//!
//! Decoding never fails on bad input. Each payload field is read on its own:
//! a mistyped field falls back to its default, an unreadable rich-text run or
//! child block is skipped, and the rest of the block survives.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::rich_text::{lenient, lenient_runs, runs_from_value, RichText};

/// A single node of the content tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawBlock")]
pub struct Block {
    /// Opaque id used to fetch children lazily
    pub id: String,
    /// Whether the source reports children for this block
    pub has_children: bool,
    pub kind: BlockKind,
    /// Children already embedded in the payload (no fetch needed)
    pub children: Option<Vec<Block>>,
}

/// Heading depth (the source only has three)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn marker(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "#",
            HeadingLevel::H2 => "##",
            HeadingLevel::H3 => "###",
        }
    }
}

/// The two list flavours; adjacent items of the same flavour form one list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    pub fn marker(self) -> &'static str {
        match self {
            ListKind::Bulleted => "-",
            // Downstream renderers renumber ordered lists
            ListKind::Numbered => "1.",
        }
    }
}

/// Link-only media kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    File,
    Pdf,
    Embed,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::File => "file",
            MediaKind::Pdf => "pdf",
            MediaKind::Embed => "embed",
        }
    }
}

/// Where a media payload points to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSource {
    /// `external.url`
    pub external: Option<String>,
    /// `file.url` (hosted by the source, usually short-lived)
    pub hosted: Option<String>,
    /// Bare `url` field (embeds)
    pub direct: Option<String>,
}

impl MediaSource {
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            external: Some(url.into()),
            ..Self::default()
        }
    }

    /// External reference, then hosted file
    pub fn file_url(&self) -> Option<&str> {
        self.external.as_deref().or(self.hosted.as_deref())
    }

    /// External, hosted, then direct url
    pub fn any_url(&self) -> Option<&str> {
        self.file_url().or(self.direct.as_deref())
    }
}

/// Kind-specific payload of a block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph {
        text: Vec<RichText>,
    },
    Heading {
        level: HeadingLevel,
        text: Vec<RichText>,
        toggleable: bool,
    },
    ListItem {
        list: ListKind,
        text: Vec<RichText>,
    },
    Quote {
        text: Vec<RichText>,
    },
    Callout {
        text: Vec<RichText>,
        icon: Option<String>,
    },
    Toggle {
        text: Vec<RichText>,
    },
    ToDo {
        text: Vec<RichText>,
        checked: bool,
    },
    Code {
        text: Vec<RichText>,
        language: String,
    },
    Image {
        source: MediaSource,
        caption: Vec<RichText>,
    },
    Media {
        kind: MediaKind,
        source: MediaSource,
        caption: Vec<RichText>,
    },
    Bookmark {
        url: Option<String>,
        caption: Vec<RichText>,
    },
    Equation {
        expression: String,
    },
    Table {
        has_column_header: bool,
    },
    TableRow {
        cells: Vec<Vec<RichText>>,
    },
    TableOfContents,
    ColumnList,
    Column,
    SyncedBlock,
    ChildPage {
        title: Option<String>,
    },
    ChildDatabase {
        title: Option<String>,
    },
    Divider,
    Breadcrumb,
    /// Any kind not listed above. `text` is the payload's `rich_text`, if it has one.
    Unsupported {
        kind: String,
        text: Option<Vec<RichText>>,
    },
}

impl Block {
    /// Leaf block with an empty id
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: String::new(),
            has_children: false,
            kind,
            children: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Embed children; marks the block as having children
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = true;
        self.children = Some(children);
        self
    }

    /// Mark as having children that must be fetched by id
    pub fn with_lazy_children(mut self) -> Self {
        self.has_children = true;
        self.children = None;
        self
    }

    /// List flavour if this block is a list item
    pub fn list_kind(&self) -> Option<ListKind> {
        match self.kind {
            BlockKind::ListItem { list, .. } => Some(list),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(default, deserialize_with = "lenient")]
    id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    has_children: bool,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Union of the payload fields of every kind. Each field is read on its
/// own, so one bad field leaves the others intact.
#[derive(Default, Deserialize)]
struct Payload {
    #[serde(default, deserialize_with = "optional_runs")]
    rich_text: Option<Vec<RichText>>,
    #[serde(default, deserialize_with = "lenient")]
    is_toggleable: bool,
    #[serde(default, deserialize_with = "lenient")]
    checked: bool,
    #[serde(default, deserialize_with = "lenient")]
    language: String,
    #[serde(default, deserialize_with = "lenient")]
    icon: Option<Icon>,
    #[serde(default, deserialize_with = "optional_blocks")]
    children: Option<Vec<Block>>,
    #[serde(default, deserialize_with = "lenient_runs")]
    caption: Vec<RichText>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    external: Option<FileRef>,
    #[serde(default, deserialize_with = "lenient")]
    file: Option<FileRef>,
    #[serde(default, deserialize_with = "lenient")]
    expression: String,
    #[serde(default, deserialize_with = "lenient")]
    has_column_header: bool,
    #[serde(default, deserialize_with = "lenient_cells")]
    cells: Vec<Vec<RichText>>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
}

#[derive(Default, Deserialize)]
struct Icon {
    #[serde(default, deserialize_with = "lenient")]
    emoji: Option<String>,
}

#[derive(Default, Deserialize)]
struct FileRef {
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
}

fn optional_runs<'de, D>(deserializer: D) -> Result<Option<Vec<RichText>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(runs_from_value(Value::deserialize(deserializer)?))
}

/// Table cells; an unreadable cell stays in place as an empty cell
fn lenient_cells<'de, D>(deserializer: D) -> Result<Vec<Vec<RichText>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(cells) => cells
            .into_iter()
            .map(|cell| runs_from_value(cell).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn optional_blocks<'de, D>(deserializer: D) -> Result<Option<Vec<Block>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blocks_from_value(Value::deserialize(deserializer)?))
}

/// Blocks of a JSON array; `None` when `value` is not an array
fn blocks_from_value(value: Value) -> Option<Vec<Block>> {
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

impl Payload {
    fn text(&mut self) -> Vec<RichText> {
        self.rich_text.take().unwrap_or_default()
    }

    fn source(&mut self) -> MediaSource {
        MediaSource {
            external: self.external.take().and_then(|f| f.url),
            hosted: self.file.take().and_then(|f| f.url),
            direct: self.url.take(),
        }
    }
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let RawBlock {
            id,
            kind,
            has_children,
            mut rest,
        } = raw;
        let kind = kind.unwrap_or_default();

        let mut payload: Payload = rest
            .remove(&kind)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        let children = payload
            .children
            .take()
            .or_else(|| rest.remove("children").and_then(blocks_from_value));

        let heading = |level, p: &mut Payload| BlockKind::Heading {
            level,
            text: p.text(),
            toggleable: p.is_toggleable,
        };
        let media = |media_kind, p: &mut Payload| BlockKind::Media {
            kind: media_kind,
            source: p.source(),
            caption: std::mem::take(&mut p.caption),
        };

        let block_kind = match kind.as_str() {
            "paragraph" => BlockKind::Paragraph {
                text: payload.text(),
            },
            "heading_1" => heading(HeadingLevel::H1, &mut payload),
            "heading_2" => heading(HeadingLevel::H2, &mut payload),
            "heading_3" => heading(HeadingLevel::H3, &mut payload),
            "bulleted_list_item" => BlockKind::ListItem {
                list: ListKind::Bulleted,
                text: payload.text(),
            },
            "numbered_list_item" => BlockKind::ListItem {
                list: ListKind::Numbered,
                text: payload.text(),
            },
            "quote" => BlockKind::Quote {
                text: payload.text(),
            },
            "callout" => BlockKind::Callout {
                text: payload.text(),
                icon: payload.icon.take().and_then(|i| i.emoji),
            },
            "toggle" => BlockKind::Toggle {
                text: payload.text(),
            },
            "to_do" => BlockKind::ToDo {
                text: payload.text(),
                checked: payload.checked,
            },
            "code" => BlockKind::Code {
                text: payload.text(),
                language: std::mem::take(&mut payload.language),
            },
            "image" => BlockKind::Image {
                source: payload.source(),
                caption: std::mem::take(&mut payload.caption),
            },
            "video" => media(MediaKind::Video, &mut payload),
            "audio" => media(MediaKind::Audio, &mut payload),
            "file" => media(MediaKind::File, &mut payload),
            "pdf" => media(MediaKind::Pdf, &mut payload),
            "embed" => media(MediaKind::Embed, &mut payload),
            "bookmark" => BlockKind::Bookmark {
                url: payload.url.take(),
                caption: std::mem::take(&mut payload.caption),
            },
            "equation" => BlockKind::Equation {
                expression: std::mem::take(&mut payload.expression),
            },
            "table" => BlockKind::Table {
                has_column_header: payload.has_column_header,
            },
            "table_row" => BlockKind::TableRow {
                cells: std::mem::take(&mut payload.cells),
            },
            "table_of_contents" => BlockKind::TableOfContents,
            "column_list" => BlockKind::ColumnList,
            "column" => BlockKind::Column,
            "synced_block" => BlockKind::SyncedBlock,
            "child_page" => BlockKind::ChildPage {
                title: payload.title.take(),
            },
            "child_database" => BlockKind::ChildDatabase {
                title: payload.title.take(),
            },
            "divider" => BlockKind::Divider,
            "breadcrumb" => BlockKind::Breadcrumb,
            _ => BlockKind::Unsupported {
                kind: kind.clone(),
                text: payload.rich_text.take(),
            },
        };

        Block {
            id,
            has_children,
            kind: block_kind,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Block {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_paragraph() {
        let block = decode(json!({
            "object": "block",
            "id": "b1",
            "type": "paragraph",
            "has_children": false,
            "paragraph": {"rich_text": [{"plain_text": "Hello"}], "color": "default"}
        }));
        assert_eq!(block.id, "b1");
        assert!(!block.has_children);
        assert_eq!(
            block.kind,
            BlockKind::Paragraph {
                text: vec![RichText::plain("Hello")]
            }
        );
    }

    #[test]
    fn test_decode_toggle_heading_with_embedded_children() {
        let block = decode(json!({
            "id": "h",
            "type": "heading_2",
            "has_children": true,
            "heading_2": {
                "rich_text": [{"plain_text": "More"}],
                "is_toggleable": true,
                "children": [{"id": "c", "type": "divider", "divider": {}}]
            }
        }));
        match &block.kind {
            BlockKind::Heading {
                level, toggleable, ..
            } => {
                assert_eq!(*level, HeadingLevel::H2);
                assert!(*toggleable);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        let children = block.children.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind, BlockKind::Divider);
    }

    #[test]
    fn test_decode_top_level_children() {
        let block = decode(json!({
            "id": "t",
            "type": "toggle",
            "has_children": true,
            "toggle": {"rich_text": []},
            "children": [{"id": "c", "type": "divider", "divider": {}}]
        }));
        assert_eq!(block.children.map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_decode_media_sources() {
        let block = decode(json!({
            "id": "i",
            "type": "image",
            "image": {"type": "file", "file": {"url": "https://s3/x.jpg", "expiry_time": "t"}}
        }));
        match block.kind {
            BlockKind::Image { source, caption } => {
                assert_eq!(source.file_url(), Some("https://s3/x.jpg"));
                assert!(caption.is_empty());
            }
            other => panic!("unexpected kind {:?}", other),
        }

        let block = decode(json!({
            "id": "e",
            "type": "embed",
            "embed": {"url": "https://example.com/widget"}
        }));
        match block.kind {
            BlockKind::Media { kind, source, .. } => {
                assert_eq!(kind, MediaKind::Embed);
                assert_eq!(source.file_url(), None);
                assert_eq!(source.any_url(), Some("https://example.com/widget"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_kind_keeps_rich_text() {
        let block = decode(json!({
            "id": "u",
            "type": "link_preview_plus",
            "link_preview_plus": {"rich_text": [{"plain_text": "x"}]}
        }));
        assert_eq!(
            block.kind,
            BlockKind::Unsupported {
                kind: "link_preview_plus".to_string(),
                text: Some(vec![RichText::plain("x")]),
            }
        );
    }

    #[test]
    fn test_decode_mistyped_field_keeps_the_rest() {
        let block = decode(json!({
            "id": "p",
            "type": "to_do",
            "to_do": {"rich_text": "not a list", "checked": true}
        }));
        assert_eq!(
            block.kind,
            BlockKind::ToDo {
                text: vec![],
                checked: true
            }
        );
    }

    #[test]
    fn test_decode_bad_caption_keeps_image_url() {
        let block = decode(json!({
            "id": "i",
            "type": "image",
            "image": {
                "type": "external",
                "external": {"url": "https://e.com/a.png"},
                "caption": "oops"
            }
        }));
        match block.kind {
            BlockKind::Image { source, caption } => {
                assert_eq!(source.file_url(), Some("https://e.com/a.png"));
                assert!(caption.is_empty());
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_run_keeps_paragraph_text() {
        let block = decode(json!({
            "id": "p",
            "type": "paragraph",
            "paragraph": {"rich_text": [
                {"plain_text": "keep me"},
                {"plain_text": "x", "annotations": {"bold": "yes"}},
                42
            ]}
        }));
        assert_eq!(
            block.kind,
            BlockKind::Paragraph {
                text: vec![RichText::plain("keep me"), RichText::plain("x")]
            }
        );
    }

    #[test]
    fn test_decode_bad_cell_and_child_skipped() {
        let block = decode(json!({
            "id": "r",
            "type": "table_row",
            "has_children": "yes",
            "table_row": {"cells": [[{"plain_text": "a"}], "bad", [{"plain_text": "c"}]]},
            "children": [{"id": "c", "type": "divider"}, "not a block"]
        }));
        assert!(!block.has_children);
        assert_eq!(
            block.kind,
            BlockKind::TableRow {
                cells: vec![
                    vec![RichText::plain("a")],
                    vec![],
                    vec![RichText::plain("c")]
                ]
            }
        );
        assert_eq!(block.children.map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_decode_missing_type() {
        let block = decode(json!({"id": "x"}));
        assert!(matches!(
            block.kind,
            BlockKind::Unsupported { ref kind, text: None } if kind.is_empty()
        ));
    }

    #[test]
    fn test_list_kind() {
        let item = Block::new(BlockKind::ListItem {
            list: ListKind::Numbered,
            text: vec![],
        });
        assert_eq!(item.list_kind(), Some(ListKind::Numbered));
        assert_eq!(Block::new(BlockKind::Divider).list_kind(), None);
    }
}
