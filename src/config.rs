//! Configuration for the parse, analysis, chunking and scan layers.
//!
//! Every section deserializes with defaults, so a TOML file only needs the
//! keys it overrides:
//!
//! ```toml
//! project_id = "web-app"
//!
//! [optimizer]
//! parallel_threshold = 2000
//! max_workers = 8
//!
//! [chunking]
//! strategy = "contextual-chunks"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CkgError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CkgConfig {
    /// Project scope stamped on every node
    pub project_id: String,
    /// Optional commit reference stamped on every node
    pub commit_ref: Option<String>,
    pub parse: ParseConfig,
    pub cache: CacheConfig,
    pub optimizer: OptimizerConfig,
    pub analysis: AnalysisConfig,
    pub chunking: ChunkingConfig,
    pub scan: ScanConfig,
}

impl Default for CkgConfig {
    fn default() -> Self {
        Self {
            project_id: "default".to_string(),
            commit_ref: None,
            parse: ParseConfig::default(),
            cache: CacheConfig::default(),
            optimizer: OptimizerConfig::default(),
            analysis: AnalysisConfig::default(),
            chunking: ChunkingConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

/// Parse policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ParseConfig {
    /// Accept trees containing ERROR nodes instead of failing the file
    pub tolerate_syntax_errors: bool,
}

/// Symbol cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Wall-clock lifetime of a cached symbol set
    pub symbol_ttl_secs: u64,
    /// Maximum number of cached symbol sets
    pub symbol_capacity: usize,
    /// Maximum number of cached scan results
    pub result_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            symbol_ttl_secs: 3600,
            symbol_capacity: 10_000,
            result_capacity: 10_000,
        }
    }
}

/// Large-codebase scan settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// File count at which the scan switches to the worker pool
    pub parallel_threshold: usize,
    /// Files per batch on the parallel path
    pub batch_size: usize,
    /// Worker count; `None` means `min(4, available cores)`
    pub max_workers: Option<usize>,
    /// Per-file time budget; a batch gets `timeout_per_file_ms * batch_len`
    pub timeout_per_file_ms: u64,
    /// Advisory resident-memory limit
    pub memory_limit_mb: u64,
    /// Serve unchanged files from the result cache
    pub enable_cache: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 1000,
            batch_size: 100,
            max_workers: None,
            timeout_per_file_ms: 5_000,
            memory_limit_mb: 512,
            enable_cache: true,
        }
    }
}

impl OptimizerConfig {
    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.unwrap_or_else(|| cores.min(4)).max(1)
    }
}

/// Dependency analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum DFS depth when tracing a flow
    pub max_flow_depth: usize,
    /// Flows visiting fewer files are discarded
    pub min_flow_files: usize,
    /// Hops considered when deriving transitive `uses` edges (0 disables)
    pub transitive_hops: usize,
    /// Files above this line count are listed as large
    pub large_file_lines: usize,
    /// Fan-in + fan-out above which a file counts as highly coupled
    pub coupling_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_flow_depth: 8,
            min_flow_files: 3,
            transitive_hops: 2,
            large_file_lines: 500,
            coupling_threshold: 10,
        }
    }
}

/// Chunk construction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Strategy used by the pipeline
    pub strategy: String,
    /// Implementation excerpt bound for functions
    pub max_implementation_lines: usize,
    /// Implementation excerpt bound for classes
    pub max_class_lines: usize,
    /// Usage examples drawn from references
    pub max_usage_examples: usize,
    /// Lines of context captured on each side of a reference
    pub reference_context_lines: usize,
    /// Maximum line distance for contextual grouping
    pub contextual_line_distance: usize,
    /// Minimum normalized Levenshtein similarity for contextual grouping
    pub name_similarity_threshold: f64,
    /// Documentation blocks shorter than this are discarded
    pub min_doc_chars: usize,
    /// Documentation blocks with fewer lines are discarded
    pub min_doc_lines: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: "one-symbol-per-chunk".to_string(),
            max_implementation_lines: 20,
            max_class_lines: 10,
            max_usage_examples: 3,
            reference_context_lines: 2,
            contextual_line_distance: 50,
            name_similarity_threshold: 0.7,
            min_doc_chars: 50,
            min_doc_lines: 2,
        }
    }
}

/// Directory scanning filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Include globs (empty = include every supported file)
    pub include: Vec<String>,
    /// Exclude globs
    pub exclude: Vec<String>,
    /// Honour .gitignore / .ignore files
    pub respect_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }
}

impl CkgConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: CkgConfig =
            toml::from_str(input).map_err(|e| CkgError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| CkgError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(CkgError::InvalidConfig("project_id must not be empty".into()));
        }
        if self.optimizer.batch_size == 0 {
            return Err(CkgError::InvalidConfig("optimizer.batch_size must be greater than 0".into()));
        }
        if self.optimizer.max_workers == Some(0) {
            return Err(CkgError::InvalidConfig("optimizer.max_workers must be greater than 0".into()));
        }
        if self.optimizer.timeout_per_file_ms == 0 {
            return Err(CkgError::InvalidConfig(
                "optimizer.timeout_per_file_ms must be greater than 0".into(),
            ));
        }
        if self.cache.symbol_capacity == 0 || self.cache.result_capacity == 0 {
            return Err(CkgError::InvalidConfig("cache capacities must be greater than 0".into()));
        }
        if !(0.0..=1.0).contains(&self.chunking.name_similarity_threshold) {
            return Err(CkgError::InvalidConfig(
                "chunking.name_similarity_threshold must be within 0.0..=1.0".into(),
            ));
        }
        if self.chunking.max_implementation_lines == 0 {
            return Err(CkgError::InvalidConfig(
                "chunking.max_implementation_lines must be greater than 0".into(),
            ));
        }
        if self.analysis.max_flow_depth == 0 {
            return Err(CkgError::InvalidConfig("analysis.max_flow_depth must be greater than 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = CkgConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.symbol_ttl_secs, 3600);
        assert_eq!(config.cache.symbol_capacity, 10_000);
        assert_eq!(config.optimizer.parallel_threshold, 1000);
        assert_eq!(config.optimizer.batch_size, 100);
        assert_eq!(config.optimizer.memory_limit_mb, 512);
        assert_eq!(config.analysis.max_flow_depth, 8);
    }

    #[test]
    fn test_worker_count_is_bounded() {
        let config = OptimizerConfig::default();
        let workers = config.worker_count();
        assert!(workers >= 1 && workers <= 4);

        let config = OptimizerConfig {
            max_workers: Some(7),
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 7);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CkgConfig::from_toml_str(
            r#"
project_id = "web-app"

[optimizer]
batch_size = 25

[chunking]
strategy = "contextual-chunks"
"#,
        )
        .unwrap();

        assert_eq!(config.project_id, "web-app");
        assert_eq!(config.optimizer.batch_size, 25);
        assert_eq!(config.optimizer.parallel_threshold, 1000);
        assert_eq!(config.chunking.strategy, "contextual-chunks");
        assert_eq!(config.chunking.max_usage_examples, 3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = CkgConfig::from_toml_str("[optimizer]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, CkgError::InvalidConfig(_)));

        let err =
            CkgConfig::from_toml_str("[chunking]\nname_similarity_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, CkgError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = CkgConfig::from_toml_str("project_id = [").unwrap_err();
        assert!(matches!(err, CkgError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("meridian.toml");
        std::fs::write(&path, "project_id = \"from-disk\"\n").unwrap();

        let config = CkgConfig::load(&path).unwrap();
        assert_eq!(config.project_id, "from-disk");

        let missing = CkgConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, CkgError::Io { .. }));
    }
}
