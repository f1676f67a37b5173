//! Caller-supplied file descriptors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::content_hash;
use crate::error::{CkgError, Result};
use crate::ingest::Language;

/// One file to process. Content may be preloaded by the caller; otherwise
/// it is read from `file_path` on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Treat as a flow entry point regardless of its name
    #[serde(default)]
    pub entry_point: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_hint: Option<Language>,
    /// Where to read from when it differs from `file_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

/// Content and modification time read from disk.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub content: String,
    pub modified: Option<SystemTime>,
}

impl FileInput {
    /// Input read from disk when needed.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content: None,
            entry_point: false,
            language_hint: None,
            source_path: None,
        }
    }

    /// Input with preloaded content.
    pub fn with_content(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(file_path)
        }
    }

    pub fn entry(mut self) -> Self {
        self.entry_point = true;
        self
    }

    pub fn hint(mut self, language: Language) -> Self {
        self.language_hint = Some(language);
        self
    }

    /// Graph-facing path used for language detection and node identity.
    pub fn path(&self) -> &Path {
        Path::new(&self.file_path)
    }

    /// Input whose graph path is `file_path` but whose bytes live at `source`.
    pub fn located(file_path: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(source.into()),
            ..Self::new(file_path)
        }
    }

    fn disk_path(&self) -> &Path {
        self.source_path.as_deref().unwrap_or_else(|| self.path())
    }

    /// Preloaded content, else the file read as UTF-8.
    pub fn load(&self) -> Result<LoadedFile> {
        if let Some(content) = &self.content {
            return Ok(LoadedFile {
                content: content.clone(),
                modified: None,
            });
        }
        let path = self.disk_path().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| CkgError::Io {
            path: path.clone(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|e| {
            CkgError::parse_failure(&path, format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()))
        })?;
        Ok(LoadedFile {
            content,
            modified: self.modified_time(),
        })
    }

    pub fn read_content(&self) -> Result<String> {
        self.load().map(|loaded| loaded.content)
    }

    /// Filesystem mtime; None for preloaded or missing files.
    pub fn modified_time(&self) -> Option<SystemTime> {
        if self.content.is_some() {
            return None;
        }
        std::fs::metadata(self.disk_path()).and_then(|m| m.modified()).ok()
    }

    /// Version component of the result-cache key: mtime in nanoseconds for
    /// on-disk files, a content digest for preloaded ones.
    pub fn version_key(&self) -> String {
        if let Some(content) = &self.content {
            return format!("sha256:{}", &content_hash(content)[..16]);
        }
        match self.modified_time().and_then(|t| t.duration_since(UNIX_EPOCH).ok()) {
            Some(since) => format!("mtime:{}", since.as_nanos()),
            None => "missing".to_string(),
        }
    }
}
