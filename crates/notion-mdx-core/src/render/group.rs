//! Sibling grouping
//!
//! Runs of adjacent list items of the same flavour are partitioned into one
//! segment before anything is rendered, so the renderer never has to skip
//! ahead inside its own loop.

use crate::block::{Block, ListKind};

/// A unit the renderer handles in one go
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment<'b> {
    /// Consecutive list items sharing `kind`
    List { kind: ListKind, items: &'b [Block] },
    Single(&'b Block),
}

/// Partition siblings into segments, preserving order
pub fn segments(blocks: &[Block]) -> Vec<Segment<'_>> {
    let mut out = Vec::new();

    for run in blocks.chunk_by(|a, b| a.list_kind().is_some() && a.list_kind() == b.list_kind()) {
        match run[0].list_kind() {
            Some(kind) => out.push(Segment::List { kind, items: run }),
            None => out.extend(run.iter().map(Segment::Single)),
        }
    }

    out
}
