//! Language detection from file extensions and caller hints.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Languages with a registered grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Rust,
    Java,
    C,
    Cpp,
}

impl Language {
    /// Every language, in registration order.
    pub const ALL: [Language; 8] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Python,
        Language::Rust,
        Language::Java,
        Language::C,
        Language::Cpp,
    ];

    /// Stable lowercase tag used in node and chunk output
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Parse a caller-supplied hint (case-insensitive, common aliases accepted)
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "jsx" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "python" | "py" => Some(Language::Python),
            "rust" | "rs" => Some(Language::Rust),
            "java" => Some(Language::Java),
            "c" => Some(Language::C),
            "cpp" | "c++" | "cxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// True for the ECMAScript family (shared import semantics)
    pub fn is_ecmascript(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript | Language::Tsx)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect language from file extension
///
/// Returns None for extensions without a grammar.
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
        "ts" | "mts" | "cts" => Some(Language::TypeScript),
        "tsx" => Some(Language::Tsx),
        "py" | "pyi" => Some(Language::Python),
        "rs" => Some(Language::Rust),
        "java" => Some(Language::Java),
        "c" | "h" => Some(Language::C),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Language::Cpp),
        _ => None,
    }
}

/// Extension of the path as written, for error messages
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_language(Path::new("src/main.rs")), Some(Language::Rust));
        assert_eq!(detect_language(Path::new("app/page.jsx")), Some(Language::JavaScript));
        assert_eq!(detect_language(Path::new("lib/index.mjs")), Some(Language::JavaScript));
        assert_eq!(detect_language(Path::new("a.ts")), Some(Language::TypeScript));
        assert_eq!(detect_language(Path::new("A.TSX")), Some(Language::Tsx));
        assert_eq!(detect_language(Path::new("tool.py")), Some(Language::Python));
        assert_eq!(detect_language(Path::new("Main.java")), Some(Language::Java));
        assert_eq!(detect_language(Path::new("x.h")), Some(Language::C));
        assert_eq!(detect_language(Path::new("x.hpp")), Some(Language::Cpp));
    }

    #[test]
    fn test_unsupported_extensions() {
        assert_eq!(detect_language(Path::new("main.go")), None);
        assert_eq!(detect_language(Path::new("README")), None);
        assert_eq!(extension_label(Path::new("main.go")), "go");
        assert_eq!(extension_label(Path::new("README")), "<none>");
    }

    #[test]
    fn test_hints() {
        assert_eq!(Language::from_hint("TypeScript"), Some(Language::TypeScript));
        assert_eq!(Language::from_hint("c++"), Some(Language::Cpp));
        assert_eq!(Language::from_hint("cobol"), None);
        for lang in Language::ALL {
            assert_eq!(Language::from_hint(lang.as_str()), Some(lang));
        }
    }
}
