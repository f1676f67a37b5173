//! Language-agnostic depth-first traversal.
//!
//! The callback runs once per node in pre-order. Per-language extractors
//! match on `node.kind()` inside the callback; nothing here knows about any
//! grammar.

use tree_sitter::Node;

/// Whether traversal should descend into the current node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    SkipChildren,
}

/// Walk `root` depth-first, pre-order, invoking `f(node, depth)` once per node.
///
/// Uses a `TreeCursor` so deep trees do not grow the call stack.
pub fn walk<'tree, F>(root: Node<'tree>, mut f: F)
where
    F: FnMut(&Node<'tree>, usize) -> Visit,
{
    let mut cursor = root.walk();
    let mut depth = 0usize;

    loop {
        let node = cursor.node();
        let descend = f(&node, depth) == Visit::Continue;

        if descend && cursor.goto_first_child() {
            depth += 1;
            continue;
        }

        // Advance to the next sibling, climbing until one exists
        loop {
            if depth == 0 {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
            depth -= 1;
        }
    }
}

/// Node counts for the generic fallback extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    pub total: usize,
    pub named: usize,
    pub errors: usize,
}

/// Count every node under `root`.
pub fn count_nodes(root: Node<'_>) -> NodeCounts {
    let mut counts = NodeCounts::default();
    walk(root, |node, _| {
        counts.total += 1;
        if node.is_named() {
            counts.named += 1;
        }
        if node.is_error() || node.is_missing() {
            counts.errors += 1;
        }
        Visit::Continue
    });
    counts
}

/// Walk ancestors (nearest first), excluding the node itself.
pub fn ancestors<'tree>(node: &Node<'tree>) -> impl Iterator<Item = Node<'tree>> {
    std::iter::successors(node.parent(), |n| n.parent())
}
