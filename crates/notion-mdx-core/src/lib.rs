//! notion-mdx core library
//!
//! Renders Notion block trees into MDX documents:
//! - `inline` translates styled rich-text runs
//! - `media` downloads images under a per-document directory
//! - `children` fetches child blocks that were not embedded
//! - `render` walks the block tree into MDX lines
//! - `document` assembles a full page body
//!
//! Around that sits the exporter: the Notion client, the document writer, and
//! the `sync` pipeline that ties them together.

pub mod block;
pub mod children;
pub mod config;
pub mod document;
pub mod error;
pub mod inline;
pub mod media;
pub mod notion;
pub mod render;
pub mod rich_text;
pub mod sync;
pub mod writer;

pub use block::{Block, BlockKind};
pub use children::ChildLoader;
pub use config::Config;
pub use document::{Assembler, RenderedDocument};
pub use error::{ConfigError, DownloadError, NotionError, RenderError};
pub use media::{Materializer, RemoteFetcher};
pub use notion::NotionClient;
pub use rich_text::RichText;
