//! Full build: scan → extract → analyse → cross-file edges → chunks.
//!
//! Every build produces a new generation. Results are partial-success
//! tolerant: files that fail are listed in `errors` and everything else
//! is still returned.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::analysis::{AnalysisReport, DependencyAnalyzer};
use crate::chunking::{Chunk, Chunker};
use crate::config::CkgConfig;
use crate::error::{CkgError, FileError, Result};
use crate::graph::{build_graph, CacheStats, Edge, FileExtraction, Node, SymbolExtractor};
use crate::input::FileInput;
use crate::optimizer::{LargeCodebaseOptimizer, ScanProgress, ScanStats};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub files: usize,
    pub extracted: usize,
    /// Files with no grammar, present as a bare File node
    pub degraded: usize,
    pub failed: usize,
    pub nodes: usize,
    pub edges: usize,
    pub chunks: usize,
    pub scan: ScanStats,
    pub symbol_cache: CacheStats,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub generation: Uuid,
    pub created_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub chunks: Vec<Chunk>,
    pub analysis: AnalysisReport,
    pub errors: Vec<FileError>,
    pub stats: PipelineStats,
}

impl PipelineResult {
    /// Pretty JSON for a persistence layer or a dump on disk.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CkgError::Other(format!("serialize build result: {}", e)))
    }
}

pub struct Pipeline {
    config: CkgConfig,
    extractor: Arc<SymbolExtractor>,
    analyzer: DependencyAnalyzer,
    chunker: Chunker,
    optimizer: LargeCodebaseOptimizer<FileExtraction>,
}

impl Pipeline {
    /// Validate `config` and wire the stages together. Fails on invalid
    /// settings or an unregistered default chunk strategy.
    pub fn new(config: CkgConfig) -> Result<Self> {
        config.validate()?;
        let extractor = Arc::new(SymbolExtractor::from_config(&config));
        let analyzer = DependencyAnalyzer::with_extractor(Arc::clone(&extractor), &config);
        let chunker = Chunker::new(config.chunking.clone(), extractor.engine().registry());
        if !chunker.strategy_names().contains(&config.chunking.strategy.as_str()) {
            return Err(CkgError::UnknownChunkStrategy(config.chunking.strategy.clone()));
        }
        let optimizer = LargeCodebaseOptimizer::new(config.optimizer.clone(), &config.cache);
        Ok(Self {
            config,
            extractor,
            analyzer,
            chunker,
            optimizer,
        })
    }

    pub fn config(&self) -> &CkgConfig {
        &self.config
    }

    pub fn chunker_mut(&mut self) -> &mut Chunker {
        &mut self.chunker
    }

    pub fn build(&mut self, files: Vec<FileInput>) -> PipelineResult {
        self.build_with_progress(files, |_| {})
    }

    pub fn build_with_progress<P>(&mut self, files: Vec<FileInput>, on_progress: P) -> PipelineResult
    where
        P: FnMut(&ScanProgress),
    {
        let started = Instant::now();
        let generation = Uuid::new_v4();
        let total = files.len();
        tracing::info!(%generation, files = total, "build started");

        let extractor = Arc::clone(&self.extractor);
        let project_id = self.config.project_id.clone();
        let commit_ref = self.config.commit_ref.clone();
        let scan = self.optimizer.optimized_scan(
            files,
            |input| extractor.extract_from_file(input, &project_id, commit_ref.as_deref()),
            on_progress,
        );
        let mut errors = scan.errors;
        let mut extractions = scan.results;

        // Cached extractions may come from a build with another commit
        for extraction in &mut extractions {
            for node in &mut extraction.nodes {
                node.commit_ref = commit_ref.clone();
            }
        }

        let mut analysis = self.analyzer.analyze_extractions(&extractions);
        analysis.errors = errors.clone();

        let graph = build_graph(&extractions, &analysis, self.config.analysis.transitive_hops);

        self.chunker.set_tested_files(analysis.tested_files().map(|s| s.to_string()));
        let mut chunks = Vec::new();
        for extraction in &extractions {
            match self.chunker.create_default_chunks(extraction) {
                Ok(file_chunks) => chunks.extend(file_chunks),
                Err(e) => {
                    tracing::error!(error = %e, "chunking aborted");
                    errors.push(FileError::from(&e));
                    break;
                }
            }
        }

        let stats = PipelineStats {
            files: total,
            extracted: extractions.len(),
            degraded: extractions.iter().filter(|e| e.degraded).count(),
            failed: total - extractions.len(),
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
            chunks: chunks.len(),
            scan: scan.stats,
            symbol_cache: self.extractor.cache_stats(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            %generation,
            nodes = stats.nodes,
            edges = stats.edges,
            chunks = stats.chunks,
            errors = errors.len(),
            duration_ms = stats.duration_ms,
            "build finished"
        );

        PipelineResult {
            generation,
            created_at: Utc::now(),
            nodes: graph.nodes,
            edges: graph.edges,
            chunks,
            analysis,
            errors,
            stats,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("project_id", &self.config.project_id)
            .field("chunker", &self.chunker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes;
    use crate::graph::{NodeType, Relationship};

    #[test]
    fn test_build_produces_graph_chunks_and_analysis() {
        let mut pipeline = Pipeline::new(CkgConfig::default()).unwrap();
        let result = pipeline.build(vec![
            FileInput::with_content(
                "src/index.js",
                "import { greet } from './greet';\nexport function main() { greet('x'); }\n",
            ),
            FileInput::with_content("src/greet.js", "export function greet(name) { return name; }\n"),
            FileInput::with_content("README.md", "# Title\n"),
        ]);

        assert!(result.errors.is_empty());
        assert_eq!(result.stats.extracted, 3);
        assert_eq!(result.stats.degraded, 1);
        let files = result.nodes.iter().filter(|n| n.node_type == NodeType::File).count();
        assert_eq!(files, 3);
        let file_id = |path: &str| {
            result
                .nodes
                .iter()
                .find(|n| n.node_type == NodeType::File && n.path == path)
                .map(|n| n.id.clone())
                .unwrap()
        };
        let (index, greet) = (file_id("src/index.js"), file_id("src/greet.js"));
        assert!(result
            .edges
            .iter()
            .any(|e| e.from_node == index && e.to_node == greet && e.relationship != Relationship::Contains));
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.analysis.internal_dependencies().count(), 1);
        assert_eq!(result.nodes.iter().filter(|n| n.commit_ref.is_some()).count(), 0);
    }

    #[test]
    fn test_invalid_default_strategy_rejected() {
        let mut config = CkgConfig::default();
        config.chunking.strategy = "paragraphs".into();
        let err = Pipeline::new(config).unwrap_err();
        assert_eq!(err.code(), error_codes::CKG_CHUNK_001_UNKNOWN_STRATEGY);
    }

    #[test]
    fn test_generations_differ() {
        let mut pipeline = Pipeline::new(CkgConfig::default()).unwrap();
        let a = pipeline.build(vec![FileInput::with_content("a.py", "def f():\n    return 1\n")]);
        let b = pipeline.build(vec![FileInput::with_content("a.py", "def f():\n    return 1\n")]);
        assert_ne!(a.generation, b.generation);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(b.stats.scan.cached, 1);
    }
}
