//! Parse engine: grammar selection and dispatch.

use std::path::{Path, PathBuf};
use tree_sitter::Tree;

use crate::config::ParseConfig;
use crate::error::{CkgError, Result};
use crate::ingest::detect::{detect_language, extension_label};
use crate::ingest::visit::{self, Visit};
use crate::ingest::{pool, CommentStyle, Language, LanguageRegistry, SymbolSet};
use crate::references::{scan_references, ReferenceFact, ReferenceRequest};

/// A parsed file. Owns the tree for the duration of one extraction.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub path: PathBuf,
    pub language: Language,
    pub tree: Tree,
    pub content: String,
}

/// Selects a grammar, parses, and dispatches extraction by language.
#[derive(Debug, Clone)]
pub struct ParseEngine {
    registry: LanguageRegistry,
    tolerate_syntax_errors: bool,
}

impl ParseEngine {
    pub fn new(registry: LanguageRegistry, config: &ParseConfig) -> Self {
        Self {
            registry,
            tolerate_syntax_errors: config.tolerate_syntax_errors,
        }
    }

    /// Every built-in language, strict parse policy.
    pub fn with_defaults() -> Self {
        Self::new(LanguageRegistry::with_defaults(), &ParseConfig::default())
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Language from the hint, else from the extension.
    pub fn resolve_language(&self, path: &Path, hint: Option<Language>) -> Result<Language> {
        hint.or_else(|| detect_language(path))
            .ok_or_else(|| CkgError::UnsupportedLanguage {
                path: path.to_path_buf(),
                detail: format!("no grammar for extension '{}'", extension_label(path)),
            })
    }

    /// Parse `content` as the language of `path` (or `hint`).
    ///
    /// Fails with `UnsupportedLanguage` when no grammar matches and with
    /// `ParseFailure` when no tree is produced or, under the strict policy,
    /// the tree contains syntax errors.
    pub fn parse(&self, path: &Path, content: &str, hint: Option<Language>) -> Result<ParseResult> {
        let language = self.resolve_language(path, hint)?;

        let tree = match self.registry.get(language) {
            Some(support) => support.parse(content),
            None => pool::with_parser(language, |parser| parser.parse(content, None)),
        }
        .map_err(|e| CkgError::parse_failure(path, e.to_string()))?
        .ok_or_else(|| CkgError::parse_failure(path, "parser produced no tree"))?;

        if tree.root_node().has_error() && !self.tolerate_syntax_errors {
            let reason = match first_error_position(&tree) {
                Some((line, col)) => format!("syntax error at {}:{}", line, col),
                None => "syntax error".to_string(),
            };
            return Err(CkgError::parse_failure(path, reason));
        }

        Ok(ParseResult {
            path: path.to_path_buf(),
            language,
            tree,
            content: content.to_string(),
        })
    }

    /// Parse raw bytes; invalid UTF-8 is a `ParseFailure` regardless of policy.
    pub fn parse_bytes(&self, path: &Path, bytes: &[u8], hint: Option<Language>) -> Result<ParseResult> {
        let content = std::str::from_utf8(bytes).map_err(|e| {
            CkgError::parse_failure(path, format!("invalid UTF-8 at byte {}", e.valid_up_to()))
        })?;
        self.parse(path, content, hint)
    }

    /// Run the language's extraction table, or the generic fallback.
    pub fn extract_symbols(&self, parsed: &ParseResult) -> SymbolSet {
        let root = parsed.tree.root_node();
        match self.registry.get(parsed.language) {
            Some(support) => support.extract_symbols(root, &parsed.content),
            None => {
                tracing::debug!(
                    path = %parsed.path.display(),
                    language = %parsed.language,
                    "no extraction table registered, counting nodes only"
                );
                SymbolSet::generic(parsed.language, root)
            }
        }
    }

    /// Re-walk the tree for call and identifier sites of known names.
    pub fn extract_references(&self, parsed: &ParseResult, request: &ReferenceRequest<'_>) -> Vec<ReferenceFact> {
        let root = parsed.tree.root_node();
        match self.registry.get(parsed.language) {
            Some(support) => support.extract_references(root, &parsed.content, request),
            None => scan_references(&crate::ingest::GrammarOnly(parsed.language), root, &parsed.content, request),
        }
    }

    pub fn comment_style(&self, language: Language) -> CommentStyle {
        match self.registry.get(language) {
            Some(support) => support.comment_style(),
            None if language == Language::Python => CommentStyle::Hash,
            None => CommentStyle::CFamily,
        }
    }
}

impl Default for ParseEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 1-indexed line and 0-indexed column of the first ERROR or MISSING node.
fn first_error_position(tree: &Tree) -> Option<(usize, usize)> {
    let mut found = None;
    visit::walk(tree.root_node(), |node, _| {
        if found.is_some() {
            return Visit::SkipChildren;
        }
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            found = Some((pos.row + 1, pos.column));
            return Visit::SkipChildren;
        }
        if node.has_error() {
            Visit::Continue
        } else {
            Visit::SkipChildren
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::GrammarOnly;

    #[test]
    fn test_parse_detects_language() {
        let engine = ParseEngine::with_defaults();
        let parsed = engine
            .parse(Path::new("src/lib.rs"), "pub fn run() {}", None)
            .unwrap();
        assert_eq!(parsed.language, Language::Rust);
        assert_eq!(parsed.tree.root_node().kind(), "source_file");
    }

    #[test]
    fn test_hint_overrides_extension() {
        let engine = ParseEngine::with_defaults();
        let parsed = engine
            .parse(Path::new("script"), "def f():\n    pass\n", Some(Language::Python))
            .unwrap();
        assert_eq!(parsed.language, Language::Python);
    }

    #[test]
    fn test_unsupported_language() {
        let engine = ParseEngine::with_defaults();
        let err = engine
            .parse(Path::new("main.go"), "package main", None)
            .unwrap_err();
        assert!(matches!(err, CkgError::UnsupportedLanguage { .. }));
        assert!(err.to_string().contains("'go'"));
    }

    #[test]
    fn test_strict_policy_rejects_syntax_errors() {
        let engine = ParseEngine::with_defaults();
        let err = engine
            .parse(Path::new("bad.js"), "function (", None)
            .unwrap_err();
        match err {
            CkgError::ParseFailure { reason, .. } => assert!(reason.starts_with("syntax error")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tolerant_policy_keeps_partial_tree() {
        let engine = ParseEngine::new(
            LanguageRegistry::with_defaults(),
            &ParseConfig {
                tolerate_syntax_errors: true,
            },
        );
        let parsed = engine
            .parse(Path::new("bad.js"), "function ok() {}\nfunction (", None)
            .unwrap();
        let symbols = engine.extract_symbols(&parsed);
        assert!(symbols.symbols.iter().any(|s| s.name == "ok"));
    }

    #[test]
    fn test_invalid_utf8_is_parse_failure() {
        let engine = ParseEngine::with_defaults();
        let err = engine
            .parse_bytes(Path::new("a.py"), &[b'x', 0xff, 0xfe], None)
            .unwrap_err();
        assert!(matches!(err, CkgError::ParseFailure { .. }));
    }

    #[test]
    fn test_unregistered_language_falls_back_to_generic() {
        let mut registry = LanguageRegistry::new();
        registry.register(GrammarOnly(Language::Rust));
        let engine = ParseEngine::new(registry, &ParseConfig::default());

        let parsed = engine
            .parse(Path::new("Main.java"), "class Main { void run() {} }", None)
            .unwrap();
        let set = engine.extract_symbols(&parsed);
        assert!(set.generic);
        assert!(set.symbols.is_empty());
        assert!(set.node_count > 0);
        assert_eq!(engine.comment_style(Language::Java), CommentStyle::CFamily);
    }
}
