//! Language registry.
//!
//! Languages are added by registering a [`LanguageSupport`] implementation;
//! nothing else in the crate switches on the language tag.

use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::{Node, Tree};

use crate::ingest::{pool, Language, SymbolSet};
use crate::references::{scan_references, ReferenceFact, ReferenceRequest};

/// Comment syntax used for documentation extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//`, `/* */`, `///`, `/** */`
    CFamily,
    /// `#` line comments and triple-quoted docstrings
    Hash,
}

impl CommentStyle {
    /// Whether a trimmed line starts or continues a comment block.
    pub fn is_comment_line(&self, trimmed: &str) -> bool {
        match self {
            CommentStyle::CFamily => {
                trimmed.starts_with("//")
                    || trimmed.starts_with("/*")
                    || trimmed.starts_with('*')
                    || trimmed.ends_with("*/")
            }
            CommentStyle::Hash => trimmed.starts_with('#') && !trimmed.starts_with("#!"),
        }
    }

    /// Comment text with markers removed.
    pub fn strip_markers<'a>(&self, trimmed: &'a str) -> &'a str {
        let text = match self {
            CommentStyle::CFamily => trimmed
                .trim_start_matches("/**")
                .trim_start_matches("/*")
                .trim_start_matches("///")
                .trim_start_matches("//!")
                .trim_start_matches("//")
                .trim_end_matches("*/")
                .trim_start_matches('*'),
            CommentStyle::Hash => trimmed.trim_start_matches('#'),
        };
        text.trim()
    }
}

/// Per-language parse, symbol and reference extraction.
///
/// Only [`LanguageSupport::language`] is required; the defaults give the
/// generic behaviour (node counts, no symbols, identifier-only references).
pub trait LanguageSupport: Send + Sync {
    fn language(&self) -> Language;

    fn grammar(&self) -> tree_sitter::Language {
        pool::grammar_for(self.language())
    }

    /// Parse with the calling thread's pooled parser.
    fn parse(&self, source: &str) -> anyhow::Result<Option<Tree>> {
        pool::with_parser(self.language(), |parser| parser.parse(source, None))
    }

    fn extract_symbols(&self, root: Node<'_>, _source: &str) -> SymbolSet {
        SymbolSet::generic(self.language(), root)
    }

    /// Callee name node when `node` is a call expression.
    fn call_target<'t>(&self, _node: &Node<'t>) -> Option<Node<'t>> {
        None
    }

    /// Node kinds treated as identifier uses.
    fn is_identifier(&self, kind: &str) -> bool {
        kind == "identifier"
    }

    fn extract_references(
        &self,
        root: Node<'_>,
        source: &str,
        request: &ReferenceRequest<'_>,
    ) -> Vec<ReferenceFact> {
        scan_references(self, root, source, request)
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::CFamily
    }
}

/// A grammar with no extraction table: the generic fallback.
#[derive(Debug, Clone, Copy)]
pub struct GrammarOnly(pub Language);

impl LanguageSupport for GrammarOnly {
    fn language(&self) -> Language {
        self.0
    }
}

/// Language tag → support lookup.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    supports: HashMap<Language, Arc<dyn LanguageSupport>>,
}

impl LanguageRegistry {
    /// Empty registry; every language falls back to generic extraction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in language.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::javascript::JavaScriptSupport);
        registry.register(super::typescript::TypeScriptSupport::typescript());
        registry.register(super::typescript::TypeScriptSupport::tsx());
        registry.register(super::python::PythonSupport);
        registry.register(super::rust::RustSupport);
        registry.register(super::java::JavaSupport);
        registry.register(super::c::CSupport);
        registry.register(super::cpp::CppSupport);
        registry
    }

    /// Register (or replace) the support for its language.
    pub fn register<S: LanguageSupport + 'static>(&mut self, support: S) -> &mut Self {
        self.supports.insert(support.language(), Arc::new(support));
        self
    }

    pub fn get(&self, language: Language) -> Option<&dyn LanguageSupport> {
        self.supports.get(&language).map(|s| s.as_ref())
    }

    pub fn contains(&self, language: Language) -> bool {
        self.supports.contains_key(&language)
    }

    /// Registered languages, sorted.
    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.supports.keys().copied().collect();
        languages.sort();
        languages
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
