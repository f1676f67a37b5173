//! Code knowledge graph: entities, per-file extraction and cross-file edges.
//!
//! A build pass produces a fresh [`Graph`] from file content. Nothing here is
//! persisted; storing nodes and edges is left to the caller.

pub mod builder;
pub mod cache;
pub mod extract;
pub mod model;

pub use builder::{build_graph, dependency_edges, transitive_edges};
pub use cache::{BoundedCache, CacheStats};
pub use extract::{FileExtraction, SymbolCache, SymbolExtractor, CALL_CONFIDENCE, REFERENCE_CONFIDENCE};
pub use model::{hop_weight, Edge, EdgeMetadata, Graph, Node, NodeMetadata, NodeType, Relationship};
