//! Block tree → MDX lines
//!
//! A recursive descent over the block tree. Siblings are first partitioned
//! into segments (see [`group`]), then each block kind is rendered by its own
//! rule. Descent goes one level deeper for nested content; depth drives the
//! indentation of list items and to-dos.
//!
//! Everything runs sequentially: child fetches and media downloads are
//! awaited before the next sibling, so output order always matches input
//! order.

mod group;
mod table;


use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::block::{Block, BlockKind, ListKind, MediaKind, MediaSource};
use crate::children::{resolve_children, ChildLoader};
use crate::error::RenderError;
use crate::inline::{escape, translate};
use crate::media::{ImageCounter, Materializer};
use crate::rich_text::{plain_text, RichText};

pub use group::{segments, Segment};
pub use table::{escape_cell, render_table};

/// Tag name of the code-solution component
pub const SOLUTION_TABS: &str = "SolutionTabs";

/// Emitted for empty paragraphs to keep vertical rhythm
const SPACER: &str = r#"<div class="my-2" />"#;

const TOC_PLACEHOLDER: &str = "<!-- table of contents placeholder -->";

/// Title shown on a code block's component, by language tag
pub fn solution_title(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "typescript" => "TypeScript Solution",
        "javascript" => "JavaScript Solution",
        "python" => "Python Solution",
        _ => "Solution",
    }
}

/// Renders the blocks of one document.
///
/// Borrows the document's image counter so every image claims the next
/// occurrence index, in render order.
pub struct Renderer<'a> {
    container_id: &'a str,
    loader: Option<&'a dyn ChildLoader>,
    materializer: &'a Materializer,
    counter: &'a mut ImageCounter,
}

impl<'a> Renderer<'a> {
    pub fn new(
        container_id: &'a str,
        materializer: &'a Materializer,
        counter: &'a mut ImageCounter,
    ) -> Self {
        Self {
            container_id,
            loader: None,
            materializer,
            counter,
        }
    }

    /// Fetch undeclared children through `loader`
    pub fn with_loader(mut self, loader: Option<&'a dyn ChildLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Render a sibling sequence at `depth`
    pub fn render_blocks<'s>(
        &'s mut self,
        blocks: &'s [Block],
        depth: usize,
    ) -> BoxFuture<'s, Result<Vec<String>, RenderError>> {
        async move {
            let mut out = Vec::new();
            for segment in segments(blocks) {
                match segment {
                    Segment::List { kind, items } => {
                        self.render_list(kind, items, depth, &mut out).await?
                    }
                    Segment::Single(block) => self.render_block(block, depth, &mut out).await?,
                }
            }
            Ok(out)
        }
        .boxed()
    }

    /// Children of `block` rendered at `depth`; empty when it has none
    async fn render_children(
        &mut self,
        block: &Block,
        depth: usize,
    ) -> Result<Vec<String>, RenderError> {
        match resolve_children(block, self.loader).await {
            Some(children) if !children.is_empty() => self.render_blocks(&children, depth).await,
            _ => Ok(Vec::new()),
        }
    }

    async fn render_list(
        &mut self,
        kind: ListKind,
        items: &[Block],
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        let indent = "  ".repeat(depth);
        for item in items {
            let text = match &item.kind {
                BlockKind::ListItem { text, .. } => translate(text),
                _ => String::new(),
            };
            out.push(format!("{}{} {}", indent, kind.marker(), text));
            out.extend(self.render_children(item, depth + 1).await?);
        }
        Ok(())
    }

    async fn render_block(
        &mut self,
        block: &Block,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        match &block.kind {
            BlockKind::Paragraph { text } => {
                let line = translate(text);
                out.push(if line.is_empty() {
                    SPACER.to_string()
                } else {
                    line
                });
            }
            BlockKind::Heading {
                level,
                text,
                toggleable,
            } => {
                let heading = format!("{} {}", level.marker(), translate(text));
                if *toggleable {
                    out.push(format!("<details>\n<summary>{}</summary>", heading));
                    out.extend(self.render_children(block, depth + 1).await?);
                    out.push("</details>".to_string());
                } else {
                    out.push(heading);
                }
            }
            BlockKind::ListItem { list, .. } => {
                self.render_list(*list, std::slice::from_ref(block), depth, out)
                    .await?
            }
            BlockKind::Quote { text } => {
                self.render_quoted(block, format!("> {}", translate(text)), depth, out)
                    .await?
            }
            BlockKind::Callout { text, icon } => {
                let icon = icon
                    .as_deref()
                    .map(|emoji| format!("{} ", emoji))
                    .unwrap_or_default();
                self.render_quoted(block, format!("> {}{}", icon, translate(text)), depth, out)
                    .await?
            }
            BlockKind::Toggle { text } => {
                out.push(format!("<details><summary>{}</summary>", translate(text)));
                out.extend(self.render_children(block, depth + 1).await?);
                out.push("</details>".to_string());
            }
            BlockKind::ToDo { text, checked } => {
                let mark = if *checked { 'x' } else { ' ' };
                out.push(format!(
                    "{}- [{}] {}",
                    "  ".repeat(depth),
                    mark,
                    translate(text)
                ));
                out.extend(self.render_children(block, depth + 1).await?);
            }
            BlockKind::Code { text, language } => render_code(text, language, out),
            BlockKind::Image { source, caption } => self.render_image(source, caption, out).await?,
            BlockKind::Media {
                kind,
                source,
                caption,
            } => render_media_link(*kind, source, caption, out),
            BlockKind::Bookmark { url, caption } => {
                if let Some(url) = url {
                    let caption = translate(caption);
                    let label = if caption.is_empty() { url } else { &caption };
                    out.push(format!("[{}]({})", label, url));
                }
            }
            BlockKind::Equation { expression } => {
                out.extend([
                    String::new(),
                    "$$".to_string(),
                    expression.clone(),
                    "$$".to_string(),
                    String::new(),
                ]);
            }
            BlockKind::Table { has_column_header } => {
                if let Some(rows) = resolve_children(block, self.loader).await {
                    let cells = rows.iter().map(row_cells).collect();
                    out.extend(render_table(cells, *has_column_header));
                }
            }
            BlockKind::ColumnList => self.render_columns(block, depth, out).await?,
            BlockKind::SyncedBlock | BlockKind::Column => {
                out.extend(self.render_children(block, depth).await?);
            }
            BlockKind::ChildPage { title } => {
                let title = title.as_deref().unwrap_or("Untitled page");
                out.push(format!("**{}**", escape(title)));
            }
            BlockKind::ChildDatabase { title } => {
                let title = title.as_deref().unwrap_or("Untitled database");
                out.push(format!("**{}**", escape(title)));
            }
            BlockKind::Divider => out.push("---".to_string()),
            BlockKind::TableOfContents => out.push(TOC_PLACEHOLDER.to_string()),
            BlockKind::Breadcrumb | BlockKind::TableRow { .. } => {}
            BlockKind::Unsupported { kind, text } => match text {
                Some(text) => out.push(translate(text)),
                None => {
                    debug!("Skipping block {} of unsupported kind '{}'", block.id, kind);
                }
            },
        }
        Ok(())
    }

    /// Quote and callout: a `> ` line, then children each re-prefixed with `> `
    async fn render_quoted(
        &mut self,
        block: &Block,
        first_line: String,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        out.push(first_line);
        let children = self.render_children(block, depth + 1).await?;
        out.extend(children.into_iter().map(|line| format!("> {}", line)));
        Ok(())
    }

    async fn render_image(
        &mut self,
        source: &MediaSource,
        caption: &[RichText],
        out: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        let Some(url) = source.file_url() else {
            return Ok(());
        };

        let index = self.counter.claim();
        let download = self
            .materializer
            .materialize(self.container_id, url, index)
            .await?;
        out.push(format!(
            "![{}]({})",
            translate(caption),
            download.local_rel_path
        ));
        Ok(())
    }

    async fn render_columns(
        &mut self,
        block: &Block,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<(), RenderError> {
        let Some(columns) = resolve_children(block, self.loader).await else {
            return Ok(());
        };

        let mut rendered = Vec::with_capacity(columns.len());
        for column in columns.iter() {
            let body = self.render_children(column, depth + 1).await?.join("\n");
            rendered.push(format!("<div class=\"mdx-column\">\n{}\n</div>", body));
        }

        if !rendered.is_empty() {
            out.push("<div class=\"mdx-columns\">".to_string());
            out.push(rendered.join("\n"));
            out.push("</div>".to_string());
        }
        Ok(())
    }
}

fn render_code(text: &[RichText], language: &str, out: &mut Vec<String>) {
    out.extend([
        String::new(),
        format!(
            "<{} title=\"{}\">",
            SOLUTION_TABS,
            solution_title(language)
        ),
        format!("```{}", language),
        plain_text(text),
        "```".to_string(),
        format!("</{}>", SOLUTION_TABS),
        String::new(),
    ]);
}

fn render_media_link(
    kind: MediaKind,
    source: &MediaSource,
    caption: &[RichText],
    out: &mut Vec<String>,
) {
    let Some(url) = source.any_url() else {
        return;
    };
    let caption = translate(caption);
    let label = if caption.is_empty() {
        kind.as_str()
    } else {
        caption.as_str()
    };
    out.push(format!("[{}]({})", label, url));
}

/// Translated, pipe-escaped cells of a table row
fn row_cells(row: &Block) -> Vec<String> {
    match &row.kind {
        BlockKind::TableRow { cells } => cells
            .iter()
            .map(|cell| escape_cell(&translate(cell)))
            .collect(),
        _ => Vec::new(),
    }
}
