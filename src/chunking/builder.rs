//! Per-symbol chunk assembly: signature, leading docs, a bounded
//! implementation excerpt and usage examples.

use rayon::prelude::*;

use crate::chunking::{Chunk, ChunkMetadata, ChunkType};
use crate::common::{line_range, stable_id};
use crate::config::ChunkingConfig;
use crate::graph::extract::FileExtraction;
use crate::graph::model::{Node, NodeType};
use crate::ingest::{CommentStyle, Language};

const MAX_COMPLEXITY: u8 = 10;

/// Builds chunks for the symbol nodes of one extraction.
pub struct ChunkBuilder<'a> {
    extraction: &'a FileExtraction,
    config: &'a ChunkingConfig,
    comment_style: CommentStyle,
    tested: bool,
    lines: Vec<&'a str>,
}

impl<'a> ChunkBuilder<'a> {
    pub fn new(
        extraction: &'a FileExtraction,
        config: &'a ChunkingConfig,
        comment_style: CommentStyle,
        tested: bool,
    ) -> Self {
        Self {
            extraction,
            config,
            comment_style,
            tested,
            lines: extraction.content.lines().collect(),
        }
    }

    /// One chunk per matching symbol node, in source order. Nodes whose
    /// span falls outside the content are logged and skipped.
    pub fn build_all<F>(&self, keep: F, chunk_type: ChunkType) -> Vec<Chunk>
    where
        F: Fn(&Node) -> bool + Sync,
    {
        let nodes: Vec<&Node> = self.extraction.symbol_nodes().filter(|n| keep(n)).collect();
        nodes
            .par_iter()
            .filter_map(|node| match self.build(node, chunk_type) {
                Some(chunk) => Some(chunk),
                None => {
                    tracing::warn!(
                        path = %self.extraction.path,
                        symbol = %node.name,
                        start = node.metadata.start_line,
                        "chunk build failed, symbol span outside content"
                    );
                    None
                }
            })
            .collect()
    }

    pub fn build(&self, node: &Node, chunk_type: ChunkType) -> Option<Chunk> {
        let meta = &node.metadata;
        if meta.start_line == 0 || meta.start_line > self.lines.len() || meta.end_line < meta.start_line {
            return None;
        }

        let docs = self.leading_docs(meta.start_line);
        let excerpt = self.excerpt(node);
        let usages = self.usage_examples(&node.name);
        let usage_count = self
            .extraction
            .references
            .iter()
            .filter(|r| r.symbol_name == node.name)
            .count();

        let signature = meta
            .signature
            .clone()
            .unwrap_or_else(|| self.lines[meta.start_line - 1].trim().to_string());

        let mut content = signature;
        if let Some(docs) = &docs {
            content.push_str("\n\n");
            content.push_str(docs);
        }
        if !excerpt.is_empty() {
            content.push_str("\n\n");
            content.push_str(&excerpt.join("\n"));
        }
        if !usages.is_empty() {
            content.push_str("\n\nUsage:\n");
            content.push_str(&usages.join("\n---\n"));
        }

        let complexity = complexity_score(node.line_count(), &excerpt, docs.as_deref());
        let start = meta.start_line.to_string();
        Some(Chunk {
            id: stable_id(&["chunk", &node.id, chunk_type.as_str(), &start]),
            node_id: node.id.clone(),
            content,
            chunk_type,
            language: node.language,
            metadata: ChunkMetadata {
                symbol_name: node.name.clone(),
                file_path: node.path.clone(),
                start_line: meta.start_line,
                end_line: meta.end_line,
                has_documentation: docs.is_some(),
                usage_count,
                complexity,
                visibility: if meta.is_public || meta.is_exported { "public" } else { "private" }.to_string(),
                test_coverage: self.tested,
                members: Vec::new(),
            },
        })
    }

    /// Comment block directly above `start_line` (1-indexed), skipping
    /// attributes and decorators. Python docstrings right after the
    /// signature count too.
    pub fn leading_docs(&self, start_line: usize) -> Option<String> {
        let mut collected: Vec<&str> = Vec::new();
        let mut idx = start_line.saturating_sub(1);
        while idx > 0 {
            let trimmed = self.lines[idx - 1].trim();
            if trimmed.starts_with("#[") || trimmed.starts_with('@') {
                idx -= 1;
                continue;
            }
            if trimmed.is_empty() || !self.comment_style.is_comment_line(trimmed) {
                break;
            }
            let text = self.comment_style.strip_markers(trimmed);
            if !text.is_empty() {
                collected.push(text);
            }
            idx -= 1;
        }
        collected.reverse();

        if collected.is_empty() && self.extraction.language == Some(Language::Python) {
            return self.docstring_after(start_line);
        }
        if collected.is_empty() {
            None
        } else {
            Some(collected.join("\n"))
        }
    }

    fn docstring_after(&self, start_line: usize) -> Option<String> {
        let first = self.lines.get(start_line)?.trim();
        let quote = ["\"\"\"", "'''"].into_iter().find(|q| first.starts_with(q))?;
        let mut text: Vec<&str> = Vec::new();
        let opening = first.trim_start_matches(quote);
        if let Some(end) = opening.find(quote) {
            return Some(opening[..end].trim().to_string()).filter(|s| !s.is_empty());
        }
        text.push(opening.trim());
        for line in self.lines.iter().skip(start_line + 1) {
            let trimmed = line.trim();
            if let Some(end) = trimmed.find(quote) {
                text.push(trimmed[..end].trim());
                break;
            }
            text.push(trimmed);
        }
        let joined = text.into_iter().filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n");
        Some(joined).filter(|s| !s.is_empty())
    }

    /// Body lines after the signature line, bounded per node type. A
    /// one-line symbol keeps its whole declaration line.
    fn excerpt(&self, node: &Node) -> Vec<&'a str> {
        let limit = match node.node_type {
            NodeType::Class | NodeType::Interface => self.config.max_class_lines,
            _ => self.config.max_implementation_lines,
        };
        if node.metadata.start_line == node.metadata.end_line {
            return line_range(&self.lines, node.metadata.start_line, node.metadata.end_line)
                .into_iter()
                .map(str::trim)
                .collect();
        }
        let end = node.metadata.end_line.min(self.lines.len());
        let body = line_range(&self.lines, node.metadata.start_line + 1, end);
        body.into_iter().take(limit).collect()
    }

    /// Up to `max_usage_examples` reference contexts for `name`.
    fn usage_examples(&self, name: &str) -> Vec<&'a str> {
        self.extraction
            .references
            .iter()
            .filter(|r| r.symbol_name == name)
            .take(self.config.max_usage_examples)
            .map(|r| r.context.as_str())
            .collect()
    }
}

/// Length term + code-block count + documentation bonus, in 1..=10.
pub fn complexity_score(lines: usize, excerpt: &[&str], docs: Option<&str>) -> u8 {
    let length = (lines / 10).min(4);
    let blocks = excerpt
        .iter()
        .filter(|l| {
            let t = l.trim_end();
            t.ends_with('{') || t.ends_with(':')
        })
        .count()
        .min(4);
    let doc_bonus = match docs {
        Some(d) if d.len() > 100 => 2,
        Some(_) => 1,
        None => 0,
    };
    (1 + length + blocks + doc_bonus).min(MAX_COMPLEXITY as usize) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CkgConfig;
    use crate::graph::extract::SymbolExtractor;
    use crate::input::FileInput;

    fn extract(path: &str, source: &str) -> FileExtraction {
        SymbolExtractor::from_config(&CkgConfig::default())
            .extract_from_file(&FileInput::with_content(path, source), "p", None)
            .unwrap()
    }

    #[test]
    fn test_chunk_carries_docs_excerpt_and_usage() {
        let source = "/**\n * Sum two values.\n */\nfunction add(a, b) {\n  return a + b;\n}\n\nfunction main() {\n  add(1, 2);\n}\n";
        let extraction = extract("src/sum.js", source);
        let config = ChunkingConfig::default();
        let builder = ChunkBuilder::new(&extraction, &config, CommentStyle::CFamily, false);
        let node = extraction.symbol_nodes().find(|n| n.name == "add").unwrap();
        let chunk = builder.build(node, ChunkType::Symbol).unwrap();

        assert!(chunk.content.starts_with("function add(a, b)"));
        assert!(chunk.content.contains("Sum two values."));
        assert!(chunk.content.contains("return a + b;"));
        assert!(chunk.content.contains("Usage:"));
        assert!(chunk.metadata.has_documentation);
        assert_eq!(chunk.metadata.usage_count, 1);
        assert_eq!(chunk.metadata.visibility, "public");
        assert_eq!(chunk.node_id, node.id);
    }

    #[test]
    fn test_one_line_symbol_keeps_implementation() {
        let source = "export function add(a, b) { return a + b; }\n";
        let extraction = extract("src/sum.js", source);
        let config = ChunkingConfig::default();
        let builder = ChunkBuilder::new(&extraction, &config, CommentStyle::CFamily, false);
        let node = extraction.symbol_nodes().find(|n| n.name == "add").unwrap();
        let chunk = builder.build(node, ChunkType::Function).unwrap();

        assert!(chunk.content.contains("return a + b;"));
    }

    #[test]
    fn test_excerpt_bounded_for_classes() {
        let mut source = String::from("class Big {\n");
        for i in 0..30 {
            source.push_str(&format!("  m{}() {{ return {}; }}\n", i, i));
        }
        source.push_str("}\n");
        let extraction = extract("src/big.js", &source);
        let config = ChunkingConfig::default();
        let builder = ChunkBuilder::new(&extraction, &config, CommentStyle::CFamily, false);
        let class = extraction.symbol_nodes().find(|n| n.name == "Big").unwrap();
        let chunk = builder.build(class, ChunkType::Symbol).unwrap();
        assert!(chunk.content.contains("m9()"));
        assert!(!chunk.content.contains("m10()"));
    }

    #[test]
    fn test_python_docstring() {
        let source = "def load(path):\n    \"\"\"Read the file at path\n    and return its rows.\"\"\"\n    return open(path).readlines()\n";
        let extraction = extract("app/io.py", source);
        let config = ChunkingConfig::default();
        let builder = ChunkBuilder::new(&extraction, &config, CommentStyle::Hash, false);
        assert_eq!(
            builder.leading_docs(1).as_deref(),
            Some("Read the file at path\nand return its rows.")
        );
    }

    #[test]
    fn test_complexity_capped() {
        let long: Vec<&str> = vec!["if x {"; 40];
        let docs = "d".repeat(200);
        assert_eq!(complexity_score(400, &long, Some(&docs)), 10);
        assert_eq!(complexity_score(1, &[], None), 1);
    }
}
