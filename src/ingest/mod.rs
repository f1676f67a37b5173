//! Parse engine: grammar selection, parsing and per-language symbol extraction.
//!
//! Each language registers a [`LanguageSupport`] implementation in a
//! [`LanguageRegistry`]; [`ParseEngine`] owns the registry and dispatches by
//! language tag. Extraction routines are plain `match node.kind()` tables run
//! inside the generic pre-order visitor in [`visit`].

pub mod c;
pub mod cpp;
pub mod detect;
pub mod engine;
pub mod java;
pub mod javascript;
pub mod pool;
pub mod python;
pub mod registry;
pub mod rust;
pub mod typescript;
pub mod visit;

pub use detect::{detect_language, Language};
pub use engine::{ParseEngine, ParseResult};
pub use registry::{CommentStyle, GrammarOnly, LanguageRegistry, LanguageSupport};

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::common::{collapse_whitespace, safe_str_slice, truncate_chars};

/// Kind of symbol extracted from source code
///
/// Language-agnostic symbol kinds that map across multiple programming languages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    /// Free function
    Function,
    /// Function inside a class/impl block
    Method,
    /// Class or struct-like type definition
    /// Covers: Rust struct, Python class, Java class/record, C struct/union, JS/TS class
    Class,
    /// Interface or trait definition
    Interface,
    /// Enum definition
    Enum,
    /// Type alias (TypeScript `type`, Rust `type`, C `typedef`)
    TypeAlias,
    /// Module-level mutable binding or field
    Variable,
    /// Module-level constant
    Constant,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::TypeAlias => "type-alias",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
        }
    }

    /// True for kinds whose body is executable code.
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

/// Separator character for FQN construction per language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSeparator {
    /// Rust, C++ use :: separator
    DoubleColon,
    /// Python, Java, JavaScript, TypeScript use . separator
    Dot,
}

impl ScopeSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeSeparator::DoubleColon => "::",
            ScopeSeparator::Dot => ".",
        }
    }
}

/// Scope names enclosing a symbol, outermost first.
///
/// The visitor only has pre-order callbacks, so scopes are rebuilt from the
/// ancestor chain instead of being pushed and popped during traversal.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<String>,
    separator: ScopeSeparator,
}

impl ScopeStack {
    pub fn new(separator: ScopeSeparator) -> Self {
        Self {
            scopes: Vec::new(),
            separator,
        }
    }

    /// Collect scope names from `node`'s ancestors using `scope_name`.
    pub fn from_ancestors<F>(node: &Node<'_>, separator: ScopeSeparator, mut scope_name: F) -> Self
    where
        F: FnMut(&Node<'_>) -> Option<String>,
    {
        let mut scopes: Vec<String> = visit::ancestors(node)
            .filter_map(|ancestor| scope_name(&ancestor))
            .collect();
        scopes.reverse();
        Self { scopes, separator }
    }

    pub fn push(&mut self, scope: impl Into<String>) {
        self.scopes.push(scope.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.scopes.pop()
    }

    /// Innermost scope, used as the symbol's parent.
    pub fn innermost(&self) -> Option<&str> {
        self.scopes.last().map(|s| s.as_str())
    }

    /// Current fully-qualified scope (empty at top level)
    pub fn current_fqn(&self) -> String {
        self.scopes.join(self.separator.as_str())
    }

    /// FQN for a symbol within the current scope
    pub fn fqn_for_symbol(&self, symbol_name: &str) -> String {
        let current = self.current_fqn();
        if current.is_empty() {
            symbol_name.to_string()
        } else if symbol_name.is_empty() {
            current
        } else {
            format!("{}{}{}", current, self.separator.as_str(), symbol_name)
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// A fact about a symbol extracted from source code
///
/// Lines are 1-indexed, columns 0-indexed bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFact {
    pub name: String,
    pub kind: SymbolKind,
    /// Fully-qualified name built from enclosing scopes
    pub fqn: String,
    /// Innermost enclosing class/impl/namespace
    pub parent: Option<String>,
    /// Declaration text up to the body, whitespace-collapsed
    pub signature: String,
    pub byte_start: usize,
    pub byte_end: usize,
    /// Start byte of the name token; never reported as a reference site
    pub name_byte_start: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub is_async: bool,
    pub is_public: bool,
    pub is_exported: bool,
}

impl SymbolFact {
    /// Build a fact spanning `node`, named by `name_node`.
    ///
    /// Flags default to false and the FQN to the bare name; extractors
    /// adjust them afterwards.
    pub fn at(node: &Node<'_>, name_node: &Node<'_>, source: &str, kind: SymbolKind) -> Option<Self> {
        let name = node_text(name_node, source).trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            kind,
            fqn: name.to_string(),
            parent: None,
            signature: signature_of(node, source),
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            name_byte_start: name_node.start_byte(),
            start_line: node.start_position().row + 1,
            start_col: node.start_position().column,
            end_line: node.end_position().row + 1,
            end_col: node.end_position().column,
            is_async: false,
            is_public: false,
            is_exported: false,
        })
    }

    /// Apply enclosing scope: FQN and parent.
    pub fn with_scope(mut self, scope: &ScopeStack) -> Self {
        self.fqn = scope.fqn_for_symbol(&self.name);
        self.parent = scope.innermost().map(|s| s.to_string());
        self
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// How an import was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// `import x from 'y'`, `use a::b`, `import a.b`, `from a import b`
    Static,
    /// `import('x')`, `importlib.import_module('x')`
    Dynamic,
    /// `import type { X } from 'y'`
    TypeOnly,
    /// `require('x')`
    Require,
    /// `#include "x.h"`
    Include,
}

/// An import or include statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportFact {
    /// Module path as written (quotes stripped)
    pub specifier: String,
    /// Names bound by the import
    pub imported_names: Vec<String>,
    pub kind: ImportKind,
    pub line: usize,
    /// Last line of the import statement; equals `line` for one-line imports
    pub end_line: usize,
    /// Inside an `if`/`try`/ternary and so not always executed
    pub is_conditional: bool,
}

impl ImportFact {
    pub fn new(specifier: impl Into<String>, kind: ImportKind, node: &Node<'_>) -> Self {
        Self {
            specifier: specifier.into(),
            imported_names: Vec::new(),
            kind,
            line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            is_conditional: false,
        }
    }

    /// Widen the recorded line span to include `node`.
    pub fn extend_span(&mut self, node: &Node<'_>) {
        self.line = self.line.min(node.start_position().row + 1);
        self.end_line = self.end_line.max(node.end_position().row + 1);
    }

    /// Whether a 1-based line falls inside the import statement.
    pub fn spans_line(&self, line: usize) -> bool {
        line >= self.line && line <= self.end_line.max(self.line)
    }

    /// Whether the specifier points at a path inside the project.
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with("./") || self.specifier.starts_with("../") || self.specifier == "."
    }
}

/// Everything one extraction routine produces for a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSet {
    pub language: Option<Language>,
    pub symbols: Vec<SymbolFact>,
    pub imports: Vec<ImportFact>,
    /// Exported names (explicit export lists and exported declarations)
    pub exports: Vec<String>,
    pub node_count: usize,
    pub named_node_count: usize,
    /// Produced by the generic fallback: counts only, no symbols
    pub generic: bool,
}

impl SymbolSet {
    pub fn new(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Default::default()
        }
    }

    /// Counts-only result for languages without an extraction table.
    pub fn generic(language: Language, root: Node<'_>) -> Self {
        let counts = visit::count_nodes(root);
        Self {
            language: Some(language),
            node_count: counts.total,
            named_node_count: counts.named,
            generic: true,
            ..Default::default()
        }
    }

    pub fn push_export(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() && !self.exports.contains(&name) {
            self.exports.push(name);
        }
    }

    /// Fill node counts and finalize ordering.
    pub(crate) fn finish(mut self, root: Node<'_>) -> Self {
        let counts = visit::count_nodes(root);
        self.node_count = counts.total;
        self.named_node_count = counts.named;
        self.symbols.sort_by_key(|s| (s.byte_start, s.name_byte_start));
        self.symbols
            .dedup_by(|a, b| a.name_byte_start == b.name_byte_start && a.kind == b.kind);
        for symbol in &mut self.symbols {
            if self.exports.contains(&symbol.name) && symbol.parent.is_none() {
                symbol.is_exported = true;
            }
        }
        self
    }
}

/// Source text of a node; empty when the span is not valid UTF-8.
pub fn node_text<'a>(node: &Node<'_>, source: &'a str) -> &'a str {
    safe_str_slice(source, node.start_byte(), node.end_byte()).unwrap_or("")
}

/// Declaration text up to the start of the body (or the first line).
pub fn signature_of(node: &Node<'_>, source: &str) -> String {
    let end = node
        .child_by_field_name("body")
        .map(|body| body.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let raw = safe_str_slice(source, node.start_byte(), end).unwrap_or("");
    let head = if node.child_by_field_name("body").is_some() {
        raw
    } else {
        raw.lines().next().unwrap_or("")
    };
    let collapsed = collapse_whitespace(head.trim_end().trim_end_matches(['{', ':']));
    truncate_chars(&collapsed, 200)
}

/// True if `node` has a direct child (named or not) of `kind`.
pub fn has_child_kind(node: &Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

/// First direct child of `kind`.
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// True if any ancestor has one of `kinds`.
pub fn inside_any(node: &Node<'_>, kinds: &[&str]) -> bool {
    visit::ancestors(node).any(|ancestor| kinds.contains(&ancestor.kind()))
}

/// Strip one layer of matching quotes.
pub fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_stack_fqn() {
        let mut stack = ScopeStack::new(ScopeSeparator::DoubleColon);
        assert_eq!(stack.fqn_for_symbol("main"), "main");
        stack.push("net");
        stack.push("Client");
        assert_eq!(stack.current_fqn(), "net::Client");
        assert_eq!(stack.fqn_for_symbol("send"), "net::Client::send");
        assert_eq!(stack.innermost(), Some("Client"));
        assert_eq!(stack.pop(), Some("Client".to_string()));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'./auth'"), "./auth");
        assert_eq!(unquote("\"stdio.h\""), "stdio.h");
        assert_eq!(unquote("`x`"), "x");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_import_relative() {
        let tree = pool::with_parser(Language::JavaScript, |p| p.parse("x", None))
            .unwrap()
            .unwrap();
        let root = tree.root_node();
        assert!(ImportFact::new("./a", ImportKind::Static, &root).is_relative());
        assert!(ImportFact::new("../a", ImportKind::Static, &root).is_relative());
        assert!(!ImportFact::new("react", ImportKind::Static, &root).is_relative());
    }

    #[test]
    fn test_symbol_kind_serialization() {
        let json = serde_json::to_string(&SymbolKind::TypeAlias).unwrap();
        assert_eq!(json, "\"type-alias\"");
        let kind: SymbolKind = serde_json::from_str("\"method\"").unwrap();
        assert_eq!(kind, SymbolKind::Method);
    }
}
