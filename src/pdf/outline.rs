//! Bookmark tree.
//!
//! The render records a flat list of headings with levels. PDF outlines are
//! a doubly linked tree, so the flat list is folded into parent, sibling and
//! child links before any object is written. A heading's parent is the
//! closest earlier heading with a smaller level; skipped levels simply nest
//! one step.

use crate::render::OutlineEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct OutlineNode {
    pub parent: Option<usize>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub first: Option<usize>,
    pub last: Option<usize>,
    /// Number of descendants, shown open.
    pub count: usize,
}

/// Links for each entry, plus the first and last top-level entries.
pub(super) struct OutlineTree {
    pub nodes: Vec<OutlineNode>,
    pub first: Option<usize>,
    pub last: Option<usize>,
}

impl OutlineTree {
    pub fn build(entries: &[OutlineEntry]) -> Self {
        let mut nodes = vec![OutlineNode::default(); entries.len()];
        let mut first = None;
        let mut last: Option<usize> = None;
        // indices of the open ancestors, shallowest first
        let mut stack: Vec<usize> = Vec::new();

        for (i, entry) in entries.iter().enumerate() {
            while stack
                .last()
                .is_some_and(|&top| entries[top].level >= entry.level)
            {
                stack.pop();
            }
            let parent = stack.last().copied();
            nodes[i].parent = parent;

            let prev = match parent {
                Some(p) => nodes[p].last,
                None => last,
            };
            if let Some(prev) = prev {
                nodes[prev].next = Some(i);
                nodes[i].prev = Some(prev);
            }
            match parent {
                Some(p) => {
                    if nodes[p].first.is_none() {
                        nodes[p].first = Some(i);
                    }
                    nodes[p].last = Some(i);
                }
                None => {
                    if first.is_none() {
                        first = Some(i);
                    }
                    last = Some(i);
                }
            }
            for &ancestor in &stack {
                nodes[ancestor].count += 1;
            }
            stack.push(i);
        }

        Self { nodes, first, last }
    }
}
