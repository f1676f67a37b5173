//! Graph entities: nodes, edges and the graph container.
//!
//! Identity is deterministic: a node id is the digest of `(name, type, path)`,
//! an edge id the digest of its endpoints, relationship and site. Two passes
//! over the same content produce the same ids.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::analysis::RelationshipStrength;
use crate::common::stable_id;
use crate::ingest::{Language, SymbolFact, SymbolKind};

/// Node category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    File,
    Function,
    Class,
    Variable,
    Type,
    Interface,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "File",
            NodeType::Function => "Function",
            NodeType::Class => "Class",
            NodeType::Variable => "Variable",
            NodeType::Type => "Type",
            NodeType::Interface => "Interface",
        }
    }
}

impl From<SymbolKind> for NodeType {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Function | SymbolKind::Method => NodeType::Function,
            SymbolKind::Class => NodeType::Class,
            SymbolKind::Interface => NodeType::Interface,
            SymbolKind::Enum | SymbolKind::TypeAlias => NodeType::Type,
            SymbolKind::Variable | SymbolKind::Constant => NodeType::Variable,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive payload of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqn: Option<String>,
    /// Enclosing class/impl/namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Finer-grained kind than the node type (`method`, `enum`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_kind: Option<SymbolKind>,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub byte_start: usize,
    pub byte_end: usize,
    pub is_async: bool,
    pub is_public: bool,
    pub is_exported: bool,
    /// File nodes only: extracted without a grammar
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// A file or code symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub path: String,
    pub language: Option<Language>,
    pub metadata: NodeMetadata,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_ref: Option<String>,
}

impl Node {
    /// Deterministic id for `(name, type, path)`.
    pub fn id_for(name: &str, node_type: NodeType, path: &str) -> String {
        stable_id(&[name, node_type.as_str(), path])
    }

    /// File node spanning `content`.
    pub fn file(path: &str, language: Option<Language>, content: &str, project_id: &str) -> Self {
        let line_count = content.lines().count();
        Self {
            id: Self::id_for(path, NodeType::File, path),
            node_type: NodeType::File,
            name: path.to_string(),
            path: path.to_string(),
            language,
            metadata: NodeMetadata {
                start_line: 1,
                end_line: line_count.max(1),
                byte_end: content.len(),
                is_public: true,
                ..Default::default()
            },
            project_id: project_id.to_string(),
            commit_ref: None,
        }
    }

    /// Symbol node from an extracted fact.
    pub fn symbol(fact: &SymbolFact, path: &str, language: Language, project_id: &str) -> Self {
        let node_type = NodeType::from(fact.kind);
        Self {
            id: Self::id_for(&fact.name, node_type, path),
            node_type,
            name: fact.name.clone(),
            path: path.to_string(),
            language: Some(language),
            metadata: NodeMetadata {
                signature: Some(fact.signature.clone()).filter(|s| !s.is_empty()),
                fqn: Some(fact.fqn.clone()),
                parent: fact.parent.clone(),
                symbol_kind: Some(fact.kind),
                start_line: fact.start_line,
                start_col: fact.start_col,
                end_line: fact.end_line,
                end_col: fact.end_col,
                byte_start: fact.byte_start,
                byte_end: fact.byte_end,
                is_async: fact.is_async,
                is_public: fact.is_public,
                is_exported: fact.is_exported,
                degraded: false,
            },
            project_id: project_id.to_string(),
            commit_ref: None,
        }
    }

    pub fn with_commit(mut self, commit_ref: Option<&str>) -> Self {
        self.commit_ref = commit_ref.map(|c| c.to_string());
        self
    }

    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    pub fn line_count(&self) -> usize {
        self.metadata.end_line.saturating_sub(self.metadata.start_line) + 1
    }
}

/// Edge relationship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    Import,
    ExternalImport,
    DynamicImport,
    TypeImport,
    Call,
    Reference,
    Composition,
    ServiceCall,
    UtilityUsage,
    ConfigUsage,
    Contains,
    Uses,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Import => "import",
            Relationship::ExternalImport => "external-import",
            Relationship::DynamicImport => "dynamic-import",
            Relationship::TypeImport => "type-import",
            Relationship::Call => "call",
            Relationship::Reference => "reference",
            Relationship::Composition => "composition",
            Relationship::ServiceCall => "service-call",
            Relationship::UtilityUsage => "utility-usage",
            Relationship::ConfigUsage => "config-usage",
            Relationship::Contains => "contains",
            Relationship::Uses => "uses",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site and analysis annotations of an edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub is_circular: bool,
    /// Import hops for derived `uses` edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<RelationshipStrength>,
}

/// Directed, typed, weighted relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub id: String,
    pub from_node: String,
    pub to_node: String,
    pub relationship: Relationship,
    pub weight: f64,
    pub confidence: f64,
    pub metadata: EdgeMetadata,
}

impl Edge {
    /// Edge with weight and confidence 1.0. The id covers the line so two
    /// call sites of the same callee stay distinct.
    pub fn new(from_node: &str, to_node: &str, relationship: Relationship, line: Option<usize>) -> Self {
        let site = line.map(|l| l.to_string()).unwrap_or_default();
        Self {
            id: stable_id(&[from_node, to_node, relationship.as_str(), &site]),
            from_node: from_node.to_string(),
            to_node: to_node.to_string(),
            relationship,
            weight: 1.0,
            confidence: 1.0,
            metadata: EdgeMetadata {
                line,
                ..Default::default()
            },
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Weight of an edge `hops` indirections away: `0.8^(hops-1)`.
pub fn hop_weight(hops: usize) -> f64 {
    0.8_f64.powi(hops.saturating_sub(1) as i32)
}

/// Nodes and edges of one build pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = Node>, edges: impl IntoIterator<Item = Edge>) {
        self.nodes.extend(nodes);
        self.edges.extend(edges);
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Merge nodes sharing an id and drop duplicate edges.
    ///
    /// The first node wins; later duplicates only widen its span. Returns the
    /// number of nodes and edges removed.
    pub fn dedup(&mut self) -> (usize, usize) {
        let before = (self.nodes.len(), self.edges.len());

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<Node> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.drain(..) {
            match index.get(&node.id) {
                Some(&at) => {
                    let kept = &mut merged[at].metadata;
                    kept.end_line = kept.end_line.max(node.metadata.end_line);
                    kept.is_exported |= node.metadata.is_exported;
                }
                None => {
                    index.insert(node.id.clone(), merged.len());
                    merged.push(node);
                }
            }
        }
        self.nodes = merged;

        let mut seen: HashSet<String> = HashSet::new();
        self.edges.retain(|edge| seen.insert(edge.id.clone()));

        (before.0 - self.nodes.len(), before.1 - self.edges.len())
    }

    /// Drop edges whose endpoints were not emitted. Returns how many.
    pub fn retain_connected(&mut self) -> usize {
        let ids: HashSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let before = self.edges.len();
        self.edges
            .retain(|e| ids.contains(&e.from_node) && ids.contains(&e.to_node));
        let dropped = before - self.edges.len();
        if dropped > 0 {
            tracing::debug!(dropped, "removed edges with missing endpoints");
        }
        dropped
    }
}
