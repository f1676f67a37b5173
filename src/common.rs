//! Text helpers shared by the extractor, analyzer and chunker.
//!
//! tree-sitter hands out byte offsets that may split multi-byte UTF-8
//! characters; every slice taken here is bounds- and boundary-checked.

use sha2::{Digest, Sha256};

/// Safely extract a UTF-8 string slice with bounds checking
///
/// Returns None if the range is inverted, exceeds the source length, or
/// does not fall on character boundaries.
pub fn safe_str_slice(source: &str, start: usize, end: usize) -> Option<&str> {
    if start <= end && end <= source.len() {
        source.get(start..end)
    } else {
        None
    }
}

/// Lines `[line - radius, line + radius]` (1-indexed, clamped) joined by `\n`
pub fn line_window(lines: &[&str], line: usize, radius: usize) -> String {
    if lines.is_empty() || line == 0 {
        return String::new();
    }
    let idx = (line - 1).min(lines.len() - 1);
    let start = idx.saturating_sub(radius);
    let end = (idx + radius + 1).min(lines.len());
    lines[start..end].join("\n")
}

/// Lines `[start_line, end_line]` (1-indexed, inclusive, clamped)
pub fn line_range<'a>(lines: &[&'a str], start_line: usize, end_line: usize) -> Vec<&'a str> {
    if lines.is_empty() || start_line == 0 || start_line > end_line {
        return Vec::new();
    }
    let start = (start_line - 1).min(lines.len());
    let end = end_line.min(lines.len());
    lines[start..end].to_vec()
}

/// Collapse runs of whitespace to single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Hex SHA-256 of the joined parts, truncated to 32 characters
///
/// Parts are separated by a NUL byte so `("ab", "c")` and `("a", "bc")`
/// never collide.
pub fn stable_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..32].to_string()
}

/// Full hex SHA-256 of content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Last path component, or the path itself
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// File name without its final extension
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Normalize separators to `/` and drop `./` prefixes
pub fn normalize_separators(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let mut trimmed = replaced.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}
