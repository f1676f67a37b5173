//! Per-file symbol and reference extraction into graph nodes and edges.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::common::content_hash;
use crate::config::{CacheConfig, CkgConfig};
use crate::error::{CkgError, Result};
use crate::graph::cache::{BoundedCache, CacheStats};
use crate::graph::model::{Edge, Node, NodeType, Relationship};
use crate::ingest::{Language, ParseEngine, SymbolSet};
use crate::input::FileInput;
use crate::references::{ReferenceFact, ReferenceKind, ReferenceRequest};

/// Confidence of an edge produced from a call site.
pub const CALL_CONFIDENCE: f64 = 0.9;
/// Confidence of an edge produced from a plain identifier use.
pub const REFERENCE_CONFIDENCE: f64 = 0.6;

/// Symbol sets keyed by path and content digest.
pub type SymbolCache = BoundedCache<String, SymbolSet>;

/// Everything extracted from one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtraction {
    pub path: String,
    pub language: Option<Language>,
    /// File node first, then one node per symbol in source order
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub references: Vec<ReferenceFact>,
    pub symbols: SymbolSet,
    #[serde(skip)]
    pub content: String,
    pub entry_point: bool,
    /// No grammar matched; only the File node was produced
    pub degraded: bool,
}

impl FileExtraction {
    pub fn file_node(&self) -> Option<&Node> {
        self.nodes.first().filter(|n| n.is_file())
    }

    pub fn symbol_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_file())
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Builds nodes and edges for single files, caching symbol sets.
#[derive(Debug)]
pub struct SymbolExtractor {
    engine: ParseEngine,
    cache: Mutex<SymbolCache>,
    context_lines: usize,
}

impl SymbolExtractor {
    pub fn new(engine: ParseEngine, cache: &CacheConfig, context_lines: usize) -> Self {
        let ttl = Some(Duration::from_secs(cache.symbol_ttl_secs)).filter(|d| !d.is_zero());
        Self {
            engine,
            cache: Mutex::new(BoundedCache::with_ttl(cache.symbol_capacity, ttl)),
            context_lines,
        }
    }

    pub fn from_config(config: &CkgConfig) -> Self {
        let engine = ParseEngine::new(crate::ingest::LanguageRegistry::with_defaults(), &config.parse);
        Self::new(engine, &config.cache, config.chunking.reference_context_lines)
    }

    pub fn engine(&self) -> &ParseEngine {
        &self.engine
    }

    pub fn cache_stats(&self) -> CacheStats {
        match self.cache.lock() {
            Ok(cache) => cache.stats(),
            Err(poisoned) => poisoned.into_inner().stats(),
        }
    }

    /// Extract one file.
    ///
    /// An unrecognised language yields a degraded extraction with only the
    /// File node. Parse and I/O failures are returned as errors for the
    /// caller to record.
    pub fn extract_from_file(
        &self,
        input: &FileInput,
        project_id: &str,
        commit_ref: Option<&str>,
    ) -> Result<FileExtraction> {
        let path = input.file_path.as_str();
        let content = input.read_content()?;

        let language = match self.engine.resolve_language(input.path(), input.language_hint) {
            Ok(language) => language,
            Err(CkgError::UnsupportedLanguage { detail, .. }) => {
                tracing::debug!(path, %detail, "unsupported language, emitting file node only");
                return Ok(degraded(input, content, project_id, commit_ref));
            }
            Err(other) => return Err(other),
        };

        let parsed = self.engine.parse(input.path(), &content, Some(language))?;
        let symbols = self.cached_symbols(path, &content, || self.engine.extract_symbols(&parsed));

        let file_node = Node::file(path, Some(language), &content, project_id).with_commit(commit_ref);
        let mut nodes = Vec::with_capacity(symbols.symbols.len() + 1);
        let mut edges = Vec::new();
        nodes.push(file_node.clone());

        for fact in &symbols.symbols {
            let node = Node::symbol(fact, path, language, project_id).with_commit(commit_ref);
            edges.push(Edge::new(&file_node.id, &node.id, Relationship::Contains, Some(fact.start_line)));
            nodes.push(node);
        }

        let known: HashSet<String> = symbols.symbols.iter().map(|s| s.name.clone()).collect();
        let definition_sites: HashSet<usize> =
            symbols.symbols.iter().map(|s| s.name_byte_start).collect();
        let request = ReferenceRequest {
            file_path: path,
            known: &known,
            definition_sites: &definition_sites,
            context_lines: self.context_lines,
        };
        let references = self.engine.extract_references(&parsed, &request);
        edges.extend(reference_edges(&nodes, &references));

        Ok(FileExtraction {
            path: path.to_string(),
            language: Some(language),
            nodes,
            edges,
            references,
            symbols,
            content,
            entry_point: input.entry_point,
            degraded: false,
        })
    }

    fn cached_symbols<F>(&self, path: &str, content: &str, extract: F) -> SymbolSet
    where
        F: FnOnce() -> SymbolSet,
    {
        let key = format!("{}\u{0}{}", path, content_hash(content));
        {
            let mut cache = match self.cache.lock() {
                Ok(cache) => cache,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        let symbols = extract();
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.put(key, symbols.clone());
        symbols
    }
}

fn degraded(input: &FileInput, content: String, project_id: &str, commit_ref: Option<&str>) -> FileExtraction {
    let mut node = Node::file(&input.file_path, None, &content, project_id).with_commit(commit_ref);
    node.metadata.degraded = true;
    FileExtraction {
        path: input.file_path.clone(),
        language: None,
        nodes: vec![node],
        edges: Vec::new(),
        references: Vec::new(),
        symbols: SymbolSet::default(),
        content,
        entry_point: input.entry_point,
        degraded: true,
    }
}

/// Join references on `(file, File)` and `(symbol, Function)`.
///
/// A reference missing either endpoint is dropped.
fn reference_edges(nodes: &[Node], references: &[ReferenceFact]) -> Vec<Edge> {
    let mut lookup: HashMap<(&str, NodeType), &str> = HashMap::new();
    for node in nodes {
        let key = if node.is_file() {
            (node.path.as_str(), NodeType::File)
        } else {
            (node.name.as_str(), node.node_type)
        };
        lookup.entry(key).or_insert(node.id.as_str());
    }

    let mut edges = Vec::new();
    for reference in references {
        let from = lookup.get(&(reference.file_path.as_str(), NodeType::File));
        let to = lookup.get(&(reference.symbol_name.as_str(), NodeType::Function));
        let (Some(from), Some(to)) = (from, to) else {
            tracing::trace!(
                symbol = %reference.symbol_name,
                path = %reference.file_path,
                line = reference.line,
                "unresolved reference dropped"
            );
            continue;
        };

        let (relationship, confidence) = match reference.kind {
            ReferenceKind::Call => (Relationship::Call, CALL_CONFIDENCE),
            ReferenceKind::Reference => (Relationship::Reference, REFERENCE_CONFIDENCE),
        };
        let mut edge = Edge::new(from, to, relationship, Some(reference.line)).with_confidence(confidence);
        edge.id = crate::common::stable_id(&[&edge.id, &reference.column.to_string()]);
        edge.metadata.column = Some(reference.column);
        edge.metadata.context = Some(reference.context.clone());
        edges.push(edge);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> SymbolExtractor {
        SymbolExtractor::from_config(&CkgConfig::default())
    }

    #[test]
    fn test_nodes_and_contains_edges() {
        let input = FileInput::with_content(
            "src/auth.js",
            "export function login(user) {\n  return validate(user);\n}\nfunction validate(u) { return !!u; }\nclass Session {}\n",
        );
        let extraction = extractor().extract_from_file(&input, "proj", Some("abc123")).unwrap();

        let names: Vec<_> = extraction.nodes.iter().map(|n| (n.name.as_str(), n.node_type)).collect();
        assert_eq!(
            names,
            vec![
                ("src/auth.js", NodeType::File),
                ("login", NodeType::Function),
                ("validate", NodeType::Function),
                ("Session", NodeType::Class),
            ]
        );
        assert!(extraction.nodes.iter().all(|n| n.commit_ref.as_deref() == Some("abc123")));
        assert!(extraction.nodes.iter().all(|n| n.project_id == "proj"));

        let contains = extraction
            .edges
            .iter()
            .filter(|e| e.relationship == Relationship::Contains)
            .count();
        assert_eq!(contains, 3);
    }

    #[test]
    fn test_call_reference_becomes_edge() {
        let input = FileInput::with_content(
            "a.js",
            "function helper() {}\nfunction run() {\n  helper();\n}\n",
        );
        let extraction = extractor().extract_from_file(&input, "p", None).unwrap();
        let calls: Vec<_> = extraction
            .edges
            .iter()
            .filter(|e| e.relationship == Relationship::Call)
            .collect();
        assert_eq!(calls.len(), 1);

        let helper_id = Node::id_for("helper", NodeType::Function, "a.js");
        let file_id = Node::id_for("a.js", NodeType::File, "a.js");
        assert_eq!(calls[0].to_node, helper_id);
        assert_eq!(calls[0].from_node, file_id);
        assert_eq!(calls[0].confidence, CALL_CONFIDENCE);
        assert_eq!(calls[0].metadata.line, Some(3));
        assert!(calls[0].metadata.context.as_deref().unwrap().contains("helper();"));
    }

    #[test]
    fn test_reference_to_class_is_dropped() {
        let input = FileInput::with_content("m.py", "class Store:\n    pass\n\ndef make():\n    return Store\n");
        let extraction = extractor().extract_from_file(&input, "p", None).unwrap();
        assert!(extraction.references.iter().any(|r| r.symbol_name == "Store"));
        assert!(extraction
            .edges
            .iter()
            .all(|e| e.relationship == Relationship::Contains));
    }

    #[test]
    fn test_every_edge_endpoint_exists() {
        let input = FileInput::with_content(
            "lib.rs",
            "pub fn a() { b(); }\nfn b() { a(); let x = a; }\npub struct S;\n",
        );
        let extraction = extractor().extract_from_file(&input, "p", None).unwrap();
        let ids: HashSet<&str> = extraction.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &extraction.edges {
            assert!(ids.contains(edge.from_node.as_str()));
            assert!(ids.contains(edge.to_node.as_str()));
        }
    }

    #[test]
    fn test_unsupported_language_degrades() {
        let input = FileInput::with_content("main.go", "package main\n\nfunc main() {}\n");
        let extraction = extractor().extract_from_file(&input, "p", None).unwrap();
        assert!(extraction.degraded);
        assert_eq!(extraction.nodes.len(), 1);
        assert!(extraction.nodes[0].metadata.degraded);
        assert!(extraction.edges.is_empty());
    }

    #[test]
    fn test_parse_failure_is_error() {
        let input = FileInput::with_content("broken.js", "function (\n");
        let err = extractor().extract_from_file(&input, "p", None).unwrap_err();
        assert!(matches!(err, CkgError::ParseFailure { .. }));
    }

    #[test]
    fn test_symbol_cache_hit_on_same_content() {
        let extractor = extractor();
        let input = FileInput::with_content("x.py", "def f():\n    pass\n");
        extractor.extract_from_file(&input, "p", None).unwrap();
        extractor.extract_from_file(&input, "p", None).unwrap();
        let stats = extractor.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);

        let changed = FileInput::with_content("x.py", "def g():\n    pass\n");
        let extraction = extractor.extract_from_file(&changed, "p", None).unwrap();
        assert_eq!(extraction.nodes[1].name, "g");
        assert_eq!(extractor.cache_stats().size, 2);
    }
}
