//! Meridian error codes
//!
//! Error codes follow the pattern: CKG-{CATEGORY}-{3-digit number}
//!
//! Categories:
//! - LANG: Language detection and grammar selection
//! - PARSE: Source parsing failures
//! - CHUNK: Chunk strategy errors
//! - SCAN: Optimizer / worker pool failures
//! - CFG: Configuration errors
//! - IO: I/O-related errors (file access, permissions)
//!
//! Each error code is stable and should not be reused.

/// No grammar registered for the file extension or language hint
pub const CKG_LANG_001_UNSUPPORTED_LANGUAGE: &str = "CKG-LANG-001";

/// Grammar could not produce a usable tree
pub const CKG_PARSE_001_PARSE_FAILURE: &str = "CKG-PARSE-001";

/// Source is not valid UTF-8
pub const CKG_PARSE_002_INVALID_ENCODING: &str = "CKG-PARSE-002";

/// Chunk strategy name is not registered
pub const CKG_CHUNK_001_UNKNOWN_STRATEGY: &str = "CKG-CHUNK-001";

/// A chunk could not be built for one symbol
pub const CKG_CHUNK_002_BUILD_FAILED: &str = "CKG-CHUNK-002";

/// Batch exceeded its time budget
pub const CKG_SCAN_001_BATCH_TIMEOUT: &str = "CKG-SCAN-001";

/// Worker panicked or failed outside a file scope
pub const CKG_SCAN_002_WORKER_ERROR: &str = "CKG-SCAN-002";

/// Scanner rejected a single file
pub const CKG_SCAN_003_FILE_FAILED: &str = "CKG-SCAN-003";

/// Invalid configuration value
pub const CKG_CFG_001_INVALID_CONFIG: &str = "CKG-CFG-001";

/// File not found or unreadable
pub const CKG_IO_001_READ_FAILED: &str = "CKG-IO-001";

/// Error code documentation
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CKG-LANG-001 | Unsupported language | File degrades to a bare File node |
/// | CKG-PARSE-001 | Parse failure | Fix syntax or enable `parse.tolerate_syntax_errors` |
/// | CKG-PARSE-002 | Invalid encoding | Convert the file to UTF-8 |
/// | CKG-CHUNK-001 | Unknown chunk strategy | Use one of the registered strategy names |
/// | CKG-CHUNK-002 | Chunk build failed | Symbol span is outside the file content |
/// | CKG-SCAN-001 | Batch timeout | Raise `optimizer.timeout_per_file_ms` |
/// | CKG-SCAN-002 | Worker error | Inspect logs; the pool keeps running |
/// | CKG-SCAN-003 | File failed in scanner | See message for the underlying cause |
/// | CKG-CFG-001 | Invalid configuration | Check the named field |
/// | CKG-IO-001 | Read failed | Check file path and permissions |
pub fn describe(code: &str) -> Option<&'static str> {
    match code {
        CKG_LANG_001_UNSUPPORTED_LANGUAGE => Some("unsupported language"),
        CKG_PARSE_001_PARSE_FAILURE => Some("parse failure"),
        CKG_PARSE_002_INVALID_ENCODING => Some("invalid encoding"),
        CKG_CHUNK_001_UNKNOWN_STRATEGY => Some("unknown chunk strategy"),
        CKG_CHUNK_002_BUILD_FAILED => Some("chunk build failed"),
        CKG_SCAN_001_BATCH_TIMEOUT => Some("batch timeout"),
        CKG_SCAN_002_WORKER_ERROR => Some("worker error"),
        CKG_SCAN_003_FILE_FAILED => Some("file failed in scanner"),
        CKG_CFG_001_INVALID_CONFIG => Some("invalid configuration"),
        CKG_IO_001_READ_FAILED => Some("read failed"),
        _ => None,
    }
}
