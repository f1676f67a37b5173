//! Meridian: a code knowledge graph builder.
//!
//! Meridian parses source files with tree-sitter, extracts symbols and
//! references into a graph of file and symbol nodes, analyses cross-file
//! dependencies (cycles, layers, user flows, quality) and cuts the result
//! into retrieval-ready chunks.
//!
//! The usual entry point is [`Pipeline`]:
//!
//! ```no_run
//! use meridian::{collect_source_files, CkgConfig, Pipeline};
//! use std::path::Path;
//!
//! let config = CkgConfig::default();
//! let files = collect_source_files(Path::new("."), &config.scan)?;
//! let mut pipeline = Pipeline::new(config)?;
//! let result = pipeline.build(files);
//! println!("{} nodes, {} chunks", result.nodes.len(), result.chunks.len());
//! # Ok::<(), meridian::CkgError>(())
//! ```
//!
//! # Position Conventions
//!
//! - **Line positions**: 1-indexed (line 1 is the first line)
//! - **Column positions**: 0-indexed (column 0 is the first character)
//! - **Byte offsets**: 0-indexed from file start
//!
//! # Partial Success
//!
//! A file that cannot be read or parsed never aborts a build. It is
//! reported as a [`FileError`] with a stable `CKG-*` code (see
//! [`error_codes`]) and left out of every other result. Files in a
//! language without a registered grammar still produce a File node.

pub mod analysis;
pub mod chunking;
pub mod common;
pub mod config;
pub mod error;
pub mod error_codes;
pub mod graph;
pub mod ingest;
pub mod input;
pub mod logging;
pub mod optimizer;
pub mod pipeline;
pub mod references;
pub mod scan;

pub use analysis::{AnalysisReport, Dependency, DependencyAnalyzer, FileProfile, FileType, Flow, Layer};
pub use chunking::{Chunk, ChunkMetadata, ChunkStrategy, ChunkType, Chunker};
pub use config::CkgConfig;
pub use error::{CkgError, FileError, Result};
pub use graph::{Edge, Graph, Node, NodeType, Relationship, SymbolExtractor};
pub use ingest::{detect_language, Language, LanguageRegistry, LanguageSupport, ParseEngine};
pub use input::FileInput;
pub use optimizer::{LargeCodebaseOptimizer, ScanProgress, ScanStats};
pub use pipeline::{Pipeline, PipelineResult, PipelineStats};
pub use scan::collect_source_files;
