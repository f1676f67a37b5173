//! Cross-file edges: direct file dependencies and derived `uses` edges.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::analysis::AnalysisReport;
use crate::graph::extract::FileExtraction;
use crate::graph::model::{hop_weight, Edge, Graph, Relationship};

/// File path → File node id.
fn file_ids(extractions: &[FileExtraction]) -> HashMap<&str, &str> {
    extractions
        .iter()
        .filter_map(|e| e.file_node().map(|n| (e.path.as_str(), n.id.as_str())))
        .collect()
}

/// One File→File edge per internal dependency, typed with its relationship.
pub fn dependency_edges(extractions: &[FileExtraction], report: &AnalysisReport) -> Vec<Edge> {
    let ids = file_ids(extractions);
    report
        .internal_dependencies()
        .filter_map(|dependency| {
            let from = ids.get(dependency.from.as_str())?;
            let to = ids.get(dependency.to.as_str())?;
            let mut edge = Edge::new(from, to, dependency.relationship, Some(dependency.line));
            edge.metadata.is_circular = dependency.is_circular;
            edge.metadata.strength = Some(dependency.strength);
            Some(edge)
        })
        .collect()
}

/// `uses` edges to every file reachable in 2..=`max_hops` import hops that
/// is not already a direct dependency. Weight decays with distance.
pub fn transitive_edges(extractions: &[FileExtraction], report: &AnalysisReport, max_hops: usize) -> Vec<Edge> {
    if max_hops < 2 {
        return Vec::new();
    }
    let ids = file_ids(extractions);

    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for dependency in report.internal_dependencies() {
        if dependency.from != dependency.to {
            adjacency
                .entry(dependency.from.as_str())
                .or_default()
                .insert(dependency.to.as_str());
        }
    }

    let mut edges = Vec::new();
    for (&start, direct) in &adjacency {
        let mut distance: HashMap<&str, usize> = HashMap::new();
        distance.insert(start, 0);
        let mut queue: VecDeque<&str> = VecDeque::from([start]);

        while let Some(file) = queue.pop_front() {
            let hops = distance[file];
            if hops == max_hops {
                continue;
            }
            for &next in adjacency.get(file).into_iter().flatten() {
                if distance.contains_key(next) {
                    continue;
                }
                distance.insert(next, hops + 1);
                queue.push_back(next);
            }
        }

        let mut reached: Vec<(&str, usize)> = distance
            .into_iter()
            .filter(|(file, hops)| *hops >= 2 && !direct.contains(file))
            .collect();
        reached.sort();
        for (target, hops) in reached {
            let (Some(from), Some(to)) = (ids.get(start), ids.get(target)) else {
                continue;
            };
            let mut edge = Edge::new(from, to, Relationship::Uses, None).with_weight(hop_weight(hops));
            edge.metadata.hops = Some(hops);
            edges.push(edge);
        }
    }
    edges
}

/// Graph of one build pass: every extraction's nodes and edges plus the
/// cross-file edges, deduplicated.
pub fn build_graph(extractions: &[FileExtraction], report: &AnalysisReport, max_hops: usize) -> Graph {
    let mut graph = Graph::new();
    for extraction in extractions {
        graph.extend(extraction.nodes.iter().cloned(), extraction.edges.iter().cloned());
    }
    graph.edges.extend(dependency_edges(extractions, report));
    graph.edges.extend(transitive_edges(extractions, report, max_hops));

    let (nodes_removed, edges_removed) = graph.dedup();
    let dangling = graph.retain_connected();
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        nodes_removed,
        edges_removed,
        dangling,
        "graph assembled"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DependencyAnalyzer;
    use crate::config::CkgConfig;
    use crate::graph::extract::SymbolExtractor;
    use crate::input::FileInput;

    fn extract(files: &[(&str, &str)]) -> Vec<FileExtraction> {
        let extractor = SymbolExtractor::from_config(&CkgConfig::default());
        files
            .iter()
            .map(|(path, content)| {
                extractor
                    .extract_from_file(&FileInput::with_content(*path, *content), "p", None)
                    .unwrap()
            })
            .collect()
    }

    fn chain() -> Vec<FileExtraction> {
        extract(&[
            ("src/a.js", "import { b } from './b';\nb();\n"),
            ("src/b.js", "import { c } from './c';\nexport function b() { c(); }\n"),
            ("src/c.js", "import { d } from './d';\nexport function c() { d(); }\n"),
            ("src/d.js", "export function d() {}\n"),
        ])
    }

    #[test]
    fn test_dependency_edges_link_file_nodes() {
        let extractions = chain();
        let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_extractions(&extractions);
        let edges = dependency_edges(&extractions, &report);
        assert_eq!(edges.len(), 3);

        let a = extractions[0].file_node().unwrap();
        let b = extractions[1].file_node().unwrap();
        let first = edges.iter().find(|e| e.from_node == a.id).unwrap();
        assert_eq!(first.to_node, b.id);
        assert_eq!(first.relationship, Relationship::Import);
        assert!(first.metadata.strength.is_some());
        assert!(!first.metadata.is_circular);
    }

    #[test]
    fn test_transitive_edges_respect_hop_limit() {
        let extractions = chain();
        let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_extractions(&extractions);

        let two = transitive_edges(&extractions, &report, 2);
        // a→c and b→d
        assert_eq!(two.len(), 2);
        assert!(two.iter().all(|e| e.relationship == Relationship::Uses));
        assert!(two.iter().all(|e| (e.weight - 0.8).abs() < 1e-9));

        let three = transitive_edges(&extractions, &report, 3);
        assert_eq!(three.len(), 3);
        let far = three.iter().find(|e| e.metadata.hops == Some(3)).unwrap();
        assert!((far.weight - 0.64).abs() < 1e-9);

        assert!(transitive_edges(&extractions, &report, 1).is_empty());
    }

    #[test]
    fn test_build_graph_endpoints_exist() {
        let extractions = chain();
        let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_extractions(&extractions);
        let graph = build_graph(&extractions, &report, 2);
        let ids = graph.node_ids();
        assert!(graph.edges.iter().all(|e| ids.contains(e.from_node.as_str()) && ids.contains(e.to_node.as_str())));
        assert!(graph.edges.iter().any(|e| e.relationship == Relationship::Contains));
    }

    #[test]
    fn test_build_graph_drops_dangling_edges() {
        let mut extractions = chain();
        let a = extractions[0].file_node().unwrap().id.clone();
        extractions[0]
            .edges
            .push(Edge::new(&a, "not-emitted", Relationship::Reference, None));
        let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_extractions(&extractions);

        let graph = build_graph(&extractions, &report, 2);
        assert!(graph.edges.iter().all(|e| e.to_node != "not-emitted"));
    }
}
