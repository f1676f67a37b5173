//! Documentation chunks from contiguous comment blocks.

use crate::chunking::{Chunk, ChunkContext, ChunkMetadata, ChunkStrategy, ChunkType, DOCUMENTATION_CHUNKS};
use crate::common::stable_id;
use crate::ingest::CommentStyle;

pub struct DocumentationChunks;

/// A run of comment lines, markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// 1-indexed, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl CommentBlock {
    fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Contiguous comment blocks in `content`, in order.
pub fn comment_blocks(content: &str, style: CommentStyle) -> Vec<CommentBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(usize, Vec<&str>)> = None;
    let mut last_line = 0;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && style.is_comment_line(trimmed) {
            let text = style.strip_markers(trimmed);
            current.get_or_insert_with(|| (idx + 1, Vec::new())).1.push(text);
            last_line = idx + 1;
            continue;
        }
        if let Some((start, texts)) = current.take() {
            blocks.push(block(start, last_line, texts));
        }
    }
    if let Some((start, texts)) = current.take() {
        blocks.push(block(start, last_line, texts));
    }
    blocks
}

fn block(start_line: usize, end_line: usize, texts: Vec<&str>) -> CommentBlock {
    let text = texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    CommentBlock {
        start_line,
        end_line,
        text,
    }
}

impl ChunkStrategy for DocumentationChunks {
    fn name(&self) -> &'static str {
        DOCUMENTATION_CHUNKS
    }

    fn chunk(&self, ctx: &ChunkContext<'_>) -> Vec<Chunk> {
        let extraction = ctx.extraction;
        let Some(file_node) = extraction.file_node() else {
            return Vec::new();
        };

        comment_blocks(&extraction.content, ctx.comment_style)
            .into_iter()
            .filter(|b| b.text.chars().count() >= ctx.config.min_doc_chars && b.line_count() >= ctx.config.min_doc_lines)
            .map(|b| {
                // Attach to a symbol starting within two lines below the block
                let owner = extraction
                    .symbol_nodes()
                    .find(|n| n.metadata.start_line > b.end_line && n.metadata.start_line <= b.end_line + 2);
                let (node_id, symbol_name, visibility) = match owner {
                    Some(n) => (
                        n.id.clone(),
                        n.name.clone(),
                        if n.metadata.is_public || n.metadata.is_exported { "public" } else { "private" },
                    ),
                    None => (file_node.id.clone(), String::new(), "public"),
                };
                let start = b.start_line.to_string();
                Chunk {
                    id: stable_id(&["documentation", &file_node.id, &start]),
                    node_id,
                    content: b.text.clone(),
                    chunk_type: ChunkType::Documentation,
                    language: extraction.language,
                    metadata: ChunkMetadata {
                        symbol_name,
                        file_path: extraction.path.clone(),
                        start_line: b.start_line,
                        end_line: b.end_line,
                        has_documentation: true,
                        usage_count: 0,
                        complexity: 1,
                        visibility: visibility.to_string(),
                        test_coverage: ctx.tested,
                        members: Vec::new(),
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunker;
    use crate::config::CkgConfig;
    use crate::graph::extract::SymbolExtractor;
    use crate::input::FileInput;

    #[test]
    fn test_blocks_split_on_code() {
        let content = "// one\n// two\nlet a = 1;\n/* three\n * four */\n";
        let blocks = comment_blocks(content, CommentStyle::CFamily);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "one\ntwo");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 2));
        assert_eq!(blocks[1].text, "three\nfour");
    }

    #[test]
    fn test_hash_style_skips_shebang() {
        let content = "#!/usr/bin/env python\n# loader for\n# config files\nimport os\n";
        let blocks = comment_blocks(content, CommentStyle::Hash);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 2);
    }

    #[test]
    fn test_short_blocks_discarded() {
        let source = "// tiny\nfunction a() {}\n\n// Computes the running total of every order in the cart,\n// applying discounts first.\nfunction total(cart) { return 0; }\n\n// single line comment that is long enough to pass the char limit\nconst x = 1;\n";
        let config = CkgConfig::default();
        let extraction = SymbolExtractor::from_config(&config)
            .extract_from_file(&FileInput::with_content("src/cart.js", source), "p", None)
            .unwrap();
        let chunks = Chunker::from_config(&config)
            .create_chunks(&extraction, DOCUMENTATION_CHUNKS)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.symbol_name, "total");
        assert!(chunks[0].content.starts_with("Computes the running total"));
        let total = extraction.symbol_nodes().find(|n| n.name == "total").unwrap();
        assert_eq!(chunks[0].node_id, total.id);
    }
}
