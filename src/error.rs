//! Error taxonomy for the knowledge-graph core.
//!
//! File-scoped failures (`UnsupportedLanguage`, `ParseFailure`) never abort a
//! multi-file pass: callers fold them into a [`FileError`] list returned next
//! to partial results. Only configuration-level errors reach the caller
//! directly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error_codes;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CkgError>;

/// Errors raised by the parse, extraction, chunking and scan layers.
#[derive(Debug, thiserror::Error)]
pub enum CkgError {
    /// No grammar is registered for the extension or hint
    #[error("unsupported language for {path}: {detail}")]
    UnsupportedLanguage { path: PathBuf, detail: String },

    /// The grammar could not produce a usable tree
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    /// Chunk strategy name not registered
    #[error("unknown chunk strategy '{0}'")]
    UnknownChunkStrategy(String),

    /// A batch exceeded `timeout_per_file * batch_size`
    #[error("batch {batch} timed out after {elapsed:?}")]
    BatchTimeout { batch: usize, elapsed: Duration },

    /// A worker failed outside of any single file
    #[error("worker {worker} failed: {message}")]
    WorkerError { worker: usize, message: String },

    /// Configuration value rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying I/O failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scanner-specific failure that fits none of the above
    #[error("{0}")]
    Other(String),
}

impl CkgError {
    /// Stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CkgError::UnsupportedLanguage { .. } => error_codes::CKG_LANG_001_UNSUPPORTED_LANGUAGE,
            CkgError::ParseFailure { .. } => error_codes::CKG_PARSE_001_PARSE_FAILURE,
            CkgError::UnknownChunkStrategy(_) => error_codes::CKG_CHUNK_001_UNKNOWN_STRATEGY,
            CkgError::BatchTimeout { .. } => error_codes::CKG_SCAN_001_BATCH_TIMEOUT,
            CkgError::WorkerError { .. } => error_codes::CKG_SCAN_002_WORKER_ERROR,
            CkgError::InvalidConfig(_) => error_codes::CKG_CFG_001_INVALID_CONFIG,
            CkgError::Io { .. } => error_codes::CKG_IO_001_READ_FAILED,
            CkgError::Other(_) => error_codes::CKG_SCAN_003_FILE_FAILED,
        }
    }

    /// Path the error is scoped to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            CkgError::UnsupportedLanguage { path, .. }
            | CkgError::ParseFailure { path, .. }
            | CkgError::Io { path, .. } => Some(path),
            _ => None,
        }
    }

    /// True for errors that only affect one file and must not abort a pass.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self,
            CkgError::UnsupportedLanguage { .. }
                | CkgError::ParseFailure { .. }
                | CkgError::Io { .. }
                | CkgError::Other(_)
        )
    }

    pub fn parse_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CkgError::ParseFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A recorded failure, returned alongside partial results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileError {
    /// File the error is scoped to (empty for batch-level errors)
    pub path: String,
    /// Stable error code (see [`crate::error_codes`])
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Record an error against an explicit path.
    pub fn from_error(path: impl Into<String>, err: &CkgError) -> Self {
        Self::new(path, err.code(), err.to_string())
    }
}

impl From<&CkgError> for FileError {
    fn from(err: &CkgError) -> Self {
        let path = err
            .path()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        FileError::new(path, err.code(), err.to_string())
    }
}
