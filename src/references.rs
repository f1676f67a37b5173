//! Call and identifier reference sites.
//!
//! References are textual: a site matches when its text equals a known symbol
//! name. No scope or type resolution is attempted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tree_sitter::Node;

use crate::common::line_window;
use crate::ingest::visit::{self, Visit};
use crate::ingest::{node_text, LanguageSupport};

/// Whether a reference site is a call or a plain identifier use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Call,
    Reference,
}

/// A fact about a reference to a symbol
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceFact {
    /// Name of the symbol being referenced
    pub symbol_name: String,
    pub file_path: String,
    /// 1-indexed
    pub line: usize,
    /// 0-indexed byte column
    pub column: usize,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    /// Surrounding source lines
    pub context: String,
    #[serde(skip)]
    pub byte_start: usize,
}

/// Inputs for one reference scan.
#[derive(Debug)]
pub struct ReferenceRequest<'a> {
    pub file_path: &'a str,
    /// Names worth matching (symbols defined in the file)
    pub known: &'a HashSet<String>,
    /// Name-token start bytes of definitions; never reported
    pub definition_sites: &'a HashSet<usize>,
    /// Lines captured on each side of the site
    pub context_lines: usize,
}

/// Walk `root` pre-order and report call and identifier sites of known names.
///
/// A call whose callee name is known yields one `Call`; its callee token is
/// then consumed so the identifier visit does not report it again.
pub fn scan_references<S: LanguageSupport + ?Sized>(
    support: &S,
    root: Node<'_>,
    source: &str,
    request: &ReferenceRequest<'_>,
) -> Vec<ReferenceFact> {
    let lines: Vec<&str> = source.lines().collect();
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut references = Vec::new();

    visit::walk(root, |node, _| {
        if node.is_error() {
            return Visit::Continue;
        }

        if let Some(target) = support.call_target(node) {
            let name = node_text(&target, source);
            if request.known.contains(name) && consumed.insert(target.start_byte()) {
                references.push(make_fact(&target, name, ReferenceKind::Call, &lines, request));
            }
            return Visit::Continue;
        }

        if support.is_identifier(node.kind()) {
            let start = node.start_byte();
            if consumed.contains(&start) || request.definition_sites.contains(&start) {
                return Visit::Continue;
            }
            let name = node_text(node, source);
            if request.known.contains(name) {
                references.push(make_fact(node, name, ReferenceKind::Reference, &lines, request));
            }
        }

        Visit::Continue
    });

    references
}

fn make_fact(
    node: &Node<'_>,
    name: &str,
    kind: ReferenceKind,
    lines: &[&str],
    request: &ReferenceRequest<'_>,
) -> ReferenceFact {
    let line = node.start_position().row + 1;
    ReferenceFact {
        symbol_name: name.to_string(),
        file_path: request.file_path.to_string(),
        line,
        column: node.start_position().column,
        kind,
        context: line_window(lines, line, request.context_lines),
        byte_start: node.start_byte(),
    }
}
