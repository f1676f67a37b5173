//! Contextual grouping: related symbols share one chunk.
//!
//! Two symbols are related when they share an enclosing class, start within
//! `contextual_line_distance` lines of each other, or have names at least
//! `name_similarity_threshold` similar. Relatedness is closed transitively
//! with a union-find.

use crate::chunking::similarity::name_similarity;
use crate::chunking::{Chunk, ChunkContext, ChunkMetadata, ChunkStrategy, ChunkType, CONTEXTUAL_CHUNKS};
use crate::common::stable_id;
use crate::config::ChunkingConfig;
use crate::graph::model::Node;

pub struct ContextualChunks;

impl ChunkStrategy for ContextualChunks {
    fn name(&self) -> &'static str {
        CONTEXTUAL_CHUNKS
    }

    fn chunk(&self, ctx: &ChunkContext<'_>) -> Vec<Chunk> {
        let members = ctx.builder().build_all(|_| true, ChunkType::Context);
        let nodes: Vec<&Node> = ctx.extraction.symbol_nodes().collect();

        // build_all drops nodes whose chunk failed; pair the rest back up
        let pairs: Vec<(&Node, Chunk)> = members
            .into_iter()
            .filter_map(|chunk| {
                nodes
                    .iter()
                    .find(|n| n.id == chunk.node_id && n.metadata.start_line == chunk.metadata.start_line)
                    .map(|n| (*n, chunk))
            })
            .collect();

        let group_nodes: Vec<&Node> = pairs.iter().map(|(n, _)| *n).collect();
        group(&group_nodes, ctx.config)
            .into_iter()
            .map(|indices| merge(indices.iter().map(|&i| &pairs[i].1).collect()))
            .collect()
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // lower index stays root so groups keep source order
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

pub fn related(a: &Node, b: &Node, config: &ChunkingConfig) -> bool {
    let same_parent = match (&a.metadata.parent, &b.metadata.parent) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    };
    same_parent
        || a.metadata.start_line.abs_diff(b.metadata.start_line) <= config.contextual_line_distance
        || name_similarity(&a.name, &b.name) >= config.name_similarity_threshold
}

/// Indices of `nodes` grouped by relatedness, groups and members in
/// source order.
pub fn group(nodes: &[&Node], config: &ChunkingConfig) -> Vec<Vec<usize>> {
    let mut sets = UnionFind::new(nodes.len());
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            if related(nodes[i], nodes[j], config) {
                sets.union(i, j);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..nodes.len() {
        let root = sets.find(i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn merge(chunks: Vec<&Chunk>) -> Chunk {
    let first = chunks[0];
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    let members: Vec<String> = chunks.iter().map(|c| c.metadata.symbol_name.clone()).collect();
    let content = chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join("\n\n");

    let mut id_parts = vec!["contextual"];
    id_parts.extend(ids);
    Chunk {
        id: stable_id(&id_parts),
        node_id: first.node_id.clone(),
        content,
        chunk_type: ChunkType::Context,
        language: first.language,
        metadata: ChunkMetadata {
            symbol_name: members.join(", "),
            file_path: first.metadata.file_path.clone(),
            start_line: chunks.iter().map(|c| c.metadata.start_line).min().unwrap_or(0),
            end_line: chunks.iter().map(|c| c.metadata.end_line).max().unwrap_or(0),
            has_documentation: chunks.iter().any(|c| c.metadata.has_documentation),
            usage_count: chunks.iter().map(|c| c.metadata.usage_count).sum(),
            complexity: chunks.iter().map(|c| c.metadata.complexity).max().unwrap_or(1),
            visibility: first.metadata.visibility.clone(),
            test_coverage: first.metadata.test_coverage,
            members,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunker;
    use crate::config::CkgConfig;
    use crate::graph::extract::SymbolExtractor;
    use crate::input::FileInput;

    fn contextual(source: &str) -> Vec<Chunk> {
        let config = CkgConfig::default();
        let extraction = SymbolExtractor::from_config(&config)
            .extract_from_file(&FileInput::with_content("src/mod.js", source), "p", None)
            .unwrap();
        Chunker::from_config(&config)
            .create_chunks(&extraction, CONTEXTUAL_CHUNKS)
            .unwrap()
    }

    #[test]
    fn test_far_apart_unrelated_symbols_split() {
        let mut source = String::from("function alpha() { return 1; }\n");
        source.push_str(&"\n".repeat(80));
        source.push_str("function zeta() { return 2; }\n");
        let chunks = contextual(&source);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.members, vec!["alpha"]);
        assert_eq!(chunks[1].metadata.members, vec!["zeta"]);
    }

    #[test]
    fn test_similar_names_grouped_across_distance() {
        let mut source = String::from("function loadUser() { return 1; }\n");
        source.push_str(&"\n".repeat(80));
        source.push_str("function loadUsers() { return 2; }\n");
        let chunks = contextual(&source);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.members, vec!["loadUser", "loadUsers"]);
        assert_eq!(chunks[0].metadata.symbol_name, "loadUser, loadUsers");
        assert!(chunks[0].content.contains("function loadUsers()"));
        assert_eq!(chunks[0].chunk_type, ChunkType::Context);
    }

    #[test]
    fn test_nearby_symbols_grouped() {
        let chunks = contextual("function a() {}\nfunction b() {}\nfunction c() {}\n");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.members.len(), 3);
        assert_eq!(chunks[0].metadata.start_line, 1);
        assert_eq!(chunks[0].metadata.end_line, 3);
    }
}
