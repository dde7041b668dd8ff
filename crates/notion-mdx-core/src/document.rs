//! Document assembly
//!
//! Turns a page's top-level blocks into the final MDX body: optional cover
//! download, block rendering, blank-line collapsing, and the component import
//! when a code solution is present.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::block::Block;
use crate::children::ChildLoader;
use crate::error::RenderError;
use crate::media::{ImageCounter, Materializer};
use crate::render::{Renderer, SOLUTION_TABS};

/// Import line prepended when the body uses the solution component
pub const SOLUTION_TABS_IMPORT: &str =
    "import SolutionTabs from '../../components/SolutionTabs.astro';";

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// A rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Final MDX body
    pub text: String,
    /// Site-relative path of the downloaded cover image
    pub cover_path: Option<String>,
}

/// Collapse any run of three or more newlines to a single blank line
pub fn collapse_blank_lines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Assembles documents against one media root and child loader.
///
/// Each [`assemble`](Self::assemble) call owns its own image counter, so
/// separate documents can be assembled concurrently.
pub struct Assembler<'a> {
    materializer: &'a Materializer,
    loader: Option<&'a dyn ChildLoader>,
}

impl<'a> Assembler<'a> {
    pub fn new(materializer: &'a Materializer) -> Self {
        Self {
            materializer,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: &'a dyn ChildLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Render `blocks` of container `container_id` into a document.
    ///
    /// The cover, when given, claims image index 1; images in the body
    /// continue from there.
    pub async fn assemble(
        &self,
        container_id: &str,
        blocks: &[Block],
        cover_url: Option<&str>,
    ) -> Result<RenderedDocument, RenderError> {
        let mut counter = ImageCounter::new();

        let cover_path = match cover_url {
            Some(url) => {
                let index = counter.claim();
                let cover = self
                    .materializer
                    .materialize(container_id, url, index)
                    .await?;
                Some(cover.local_rel_path)
            }
            None => None,
        };

        let lines = Renderer::new(container_id, self.materializer, &mut counter)
            .with_loader(self.loader)
            .render_blocks(blocks, 0)
            .await?;

        let marker = format!("<{}", SOLUTION_TABS);
        let uses_component = lines.iter().any(|line| line.contains(&marker));

        let mut text = lines.join("\n");
        if uses_component {
            text = format!("{}\n\n{}", SOLUTION_TABS_IMPORT, text);
        }
        let text = collapse_blank_lines(&text);

        debug!(
            "Assembled {}: {} lines, {} images",
            container_id,
            lines.len(),
            counter.issued()
        );

        Ok(RenderedDocument { text, cover_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, HeadingLevel, MediaSource};
    use crate::children::tests::MapLoader;
    use crate::media::tests::RecordingFetcher;
    use crate::rich_text::RichText;
    use std::sync::Arc;

    fn text(s: &str) -> Vec<RichText> {
        vec![RichText::plain(s)]
    }

    fn image(url: &str) -> Block {
        Block::new(BlockKind::Image {
            source: MediaSource::external(url),
            caption: vec![],
        })
    }

    fn code(lang: &str, body: &str) -> Block {
        Block::new(BlockKind::Code {
            text: text(body),
            language: lang.to_string(),
        })
    }

    fn materializer(dir: &tempfile::TempDir) -> Materializer {
        Materializer::new(dir.path(), Arc::new(RecordingFetcher::default()))
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\n\nb\n\nc\nd"), "a\n\nb\n\nc\nd");
        assert_eq!(collapse_blank_lines("plain"), "plain");
    }

    #[tokio::test]
    async fn test_end_to_end_page() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = materializer(&dir);
        let blocks = vec![
            Block::new(BlockKind::Heading {
                level: HeadingLevel::H1,
                text: text("Title"),
                toggleable: false,
            }),
            Block::new(BlockKind::Paragraph {
                text: text("Hello"),
            }),
            code("python", "print(1)"),
        ];

        let doc = Assembler::new(&materializer)
            .assemble("p1", &blocks, None)
            .await
            .unwrap();

        assert_eq!(doc.cover_path, None);
        // Headings emit a single line, so no blank line follows `# Title`
        assert_eq!(
            doc.text,
            "import SolutionTabs from '../../components/SolutionTabs.astro';\n\n\
             # Title\n\
             Hello\n\
             \n\
             <SolutionTabs title=\"Python Solution\">\n\
             ```python\n\
             print(1)\n\
             ```\n\
             </SolutionTabs>\n"
        );
    }

    #[tokio::test]
    async fn test_import_only_with_component() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = materializer(&dir);
        let assembler = Assembler::new(&materializer);

        let plain = vec![Block::new(BlockKind::Paragraph { text: text("x") })];
        let doc = assembler.assemble("p", &plain, None).await.unwrap();
        assert_eq!(doc.text, "x");

        let two_solutions = vec![code("python", "a"), code("typescript", "b")];
        let doc = assembler.assemble("p", &two_solutions, None).await.unwrap();
        assert_eq!(doc.text.matches(SOLUTION_TABS_IMPORT).count(), 1);
        assert!(doc.text.starts_with(SOLUTION_TABS_IMPORT));
    }

    #[tokio::test]
    async fn test_adjacent_code_blocks_collapse_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = materializer(&dir);
        let blocks = vec![code("python", "a"), code("python", "b")];

        let doc = Assembler::new(&materializer)
            .assemble("p", &blocks, None)
            .await
            .unwrap();
        assert!(!doc.text.contains("\n\n\n"));
        assert!(doc
            .text
            .starts_with(&format!("{}\n\n<SolutionTabs", SOLUTION_TABS_IMPORT)));
        assert!(doc.text.contains("</SolutionTabs>\n\n<SolutionTabs"));
    }

    #[tokio::test]
    async fn test_cover_claims_first_index() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = materializer(&dir);
        let blocks = vec![
            image("https://cdn.example.com/one.jpg"),
            image("https://cdn.example.com/two.webp"),
        ];

        let doc = Assembler::new(&materializer)
            .assemble("pg", &blocks, Some("https://cdn.example.com/cover.png"))
            .await
            .unwrap();

        assert_eq!(doc.cover_path.as_deref(), Some("/notion/pg/img-1.png"));
        assert_eq!(
            doc.text,
            "![](/notion/pg/img-2.jpg)\n![](/notion/pg/img-3.webp)"
        );
        for name in ["img-1.png", "img-2.jpg", "img-3.webp"] {
            assert!(dir.path().join("pg").join(name).exists(), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_each_document_restarts_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = materializer(&dir);
        let assembler = Assembler::new(&materializer);
        let blocks = vec![image("https://cdn.example.com/a.png")];

        let first = assembler.assemble("a", &blocks, None).await.unwrap();
        let second = assembler.assemble("b", &blocks, None).await.unwrap();
        assert_eq!(first.text, "![](/notion/a/img-1.png)");
        assert_eq!(second.text, "![](/notion/b/img-1.png)");
    }

    #[tokio::test]
    async fn test_loader_used_for_lazy_children() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = materializer(&dir);
        let loader = MapLoader::default().with(
            "q",
            vec![Block::new(BlockKind::Paragraph {
                text: text("nested"),
            })],
        );
        let blocks = vec![Block::new(BlockKind::Quote { text: text("top") })
            .with_id("q")
            .with_lazy_children()];

        let doc = Assembler::new(&materializer)
            .with_loader(&loader)
            .assemble("p", &blocks, None)
            .await
            .unwrap();
        assert_eq!(doc.text, "> top\n> nested");
    }
}
