//! Semantic chunking of extracted files for embedding and retrieval.
//!
//! A [`Chunker`] holds a registry of named [`ChunkStrategy`] implementations.
//! The built-in strategies are:
//!
//! - `one-symbol-per-chunk`: one chunk per symbol node
//! - `one-function-per-chunk`: the same, Function nodes only
//! - `contextual-chunks`: related symbols grouped into one chunk
//! - `documentation-chunks`: standalone comment blocks
//!
//! A symbol whose chunk cannot be built is logged and left out; it never
//! fails the call. Only an unknown strategy name is an error.

pub mod builder;
pub mod contextual;
pub mod documentation;
pub mod similarity;

pub use builder::ChunkBuilder;
pub use similarity::{levenshtein_distance, name_similarity};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::config::{ChunkingConfig, CkgConfig};
use crate::error::{CkgError, Result};
use crate::graph::extract::FileExtraction;
use crate::graph::model::NodeType;
use crate::ingest::{CommentStyle, Language, LanguageRegistry};

pub const ONE_SYMBOL_PER_CHUNK: &str = "one-symbol-per-chunk";
pub const ONE_FUNCTION_PER_CHUNK: &str = "one-function-per-chunk";
pub const CONTEXTUAL_CHUNKS: &str = "contextual-chunks";
pub const DOCUMENTATION_CHUNKS: &str = "documentation-chunks";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Symbol,
    Function,
    Context,
    Documentation,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Symbol => "symbol",
            ChunkType::Function => "function",
            ChunkType::Context => "context",
            ChunkType::Documentation => "documentation",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub symbol_name: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub has_documentation: bool,
    pub usage_count: usize,
    /// Ranking heuristic, 1..=10
    pub complexity: u8,
    pub visibility: String,
    /// A test file exercises the chunk's file
    pub test_coverage: bool,
    /// Symbol names grouped into a contextual chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// A bounded text excerpt prepared for embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub node_id: String,
    pub content: String,
    pub chunk_type: ChunkType,
    pub language: Option<Language>,
    pub metadata: ChunkMetadata,
}

/// Inputs shared by every strategy for one extraction.
pub struct ChunkContext<'a> {
    pub extraction: &'a FileExtraction,
    pub config: &'a ChunkingConfig,
    pub comment_style: CommentStyle,
    pub tested: bool,
}

impl<'a> ChunkContext<'a> {
    pub fn builder(&self) -> ChunkBuilder<'a> {
        ChunkBuilder::new(self.extraction, self.config, self.comment_style, self.tested)
    }
}

/// A named way of turning one extraction into chunks.
pub trait ChunkStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn chunk(&self, ctx: &ChunkContext<'_>) -> Vec<Chunk>;
}

pub struct OneSymbolPerChunk;

impl ChunkStrategy for OneSymbolPerChunk {
    fn name(&self) -> &'static str {
        ONE_SYMBOL_PER_CHUNK
    }

    fn chunk(&self, ctx: &ChunkContext<'_>) -> Vec<Chunk> {
        ctx.builder().build_all(|_| true, ChunkType::Symbol)
    }
}

pub struct OneFunctionPerChunk;

impl ChunkStrategy for OneFunctionPerChunk {
    fn name(&self) -> &'static str {
        ONE_FUNCTION_PER_CHUNK
    }

    fn chunk(&self, ctx: &ChunkContext<'_>) -> Vec<Chunk> {
        ctx.builder()
            .build_all(|node| node.node_type == NodeType::Function, ChunkType::Function)
    }
}

/// Strategy registry plus the per-language comment styles.
pub struct Chunker {
    config: ChunkingConfig,
    strategies: BTreeMap<&'static str, Box<dyn ChunkStrategy>>,
    comment_styles: BTreeMap<Language, CommentStyle>,
    tested_files: HashSet<String>,
}

impl Chunker {
    pub fn new(config: ChunkingConfig, registry: &LanguageRegistry) -> Self {
        let comment_styles = registry
            .languages()
            .into_iter()
            .filter_map(|language| registry.get(language).map(|s| (language, s.comment_style())))
            .collect();
        let mut chunker = Self {
            config,
            strategies: BTreeMap::new(),
            comment_styles,
            tested_files: HashSet::new(),
        };
        chunker.register(OneSymbolPerChunk);
        chunker.register(OneFunctionPerChunk);
        chunker.register(contextual::ContextualChunks);
        chunker.register(documentation::DocumentationChunks);
        chunker
    }

    pub fn from_config(config: &CkgConfig) -> Self {
        Self::new(config.chunking.clone(), &LanguageRegistry::with_defaults())
    }

    /// Register (or replace) a strategy under its name.
    pub fn register<S: ChunkStrategy + 'static>(&mut self, strategy: S) -> &mut Self {
        self.strategies.insert(strategy.name(), Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.keys().copied().collect()
    }

    /// Files a test exercises; their chunks get `testCoverage = true`.
    pub fn set_tested_files(&mut self, files: impl IntoIterator<Item = String>) {
        self.tested_files = files.into_iter().collect();
    }

    pub fn create_chunks(&self, extraction: &FileExtraction, strategy: &str) -> Result<Vec<Chunk>> {
        let strategy = self
            .strategies
            .get(strategy)
            .ok_or_else(|| CkgError::UnknownChunkStrategy(strategy.to_string()))?;

        let comment_style = extraction
            .language
            .and_then(|language| self.comment_styles.get(&language).copied())
            .unwrap_or(CommentStyle::CFamily);
        let ctx = ChunkContext {
            extraction,
            config: &self.config,
            comment_style,
            tested: self.tested_files.contains(&extraction.path),
        };
        let chunks = strategy.chunk(&ctx);
        tracing::trace!(path = %extraction.path, strategy = strategy.name(), chunks = chunks.len(), "chunked");
        Ok(chunks)
    }

    /// Chunk with the configured default strategy.
    pub fn create_default_chunks(&self, extraction: &FileExtraction) -> Result<Vec<Chunk>> {
        self.create_chunks(extraction, &self.config.strategy)
    }
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("strategies", &self.strategy_names())
            .field("tested_files", &self.tested_files.len())
            .finish()
    }
}
