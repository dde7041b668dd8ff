//! Child resolution
//!
//! Children are either embedded in the block already or fetched lazily
//! through an injected [`ChildLoader`]. A failing loader is not fatal: the
//! block simply renders as if it had no children.

use std::borrow::Cow;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::block::Block;

/// Fetches the direct children of a block by id (all pages of them)
#[async_trait]
pub trait ChildLoader: Send + Sync {
    async fn load_children(&self, block_id: &str) -> Result<Vec<Block>>;
}

/// Direct children of `block`.
///
/// `None` when the block declares no children. Embedded children are
/// borrowed; otherwise the loader is asked, and any failure (or a missing
/// loader) yields an empty list.
pub async fn resolve_children<'b>(
    block: &'b Block,
    loader: Option<&dyn ChildLoader>,
) -> Option<Cow<'b, [Block]>> {
    if !block.has_children {
        return None;
    }

    if let Some(children) = &block.children {
        return Some(Cow::Borrowed(children.as_slice()));
    }

    let Some(loader) = loader else {
        return Some(Cow::Owned(Vec::new()));
    };

    match loader.load_children(&block.id).await {
        Ok(children) => Some(Cow::Owned(children)),
        Err(e) => {
            warn!("Failed to load children of block {}: {:#}", block.id, e);
            Some(Cow::Owned(Vec::new()))
        }
    }
}
