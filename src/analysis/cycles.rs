//! Circular dependency detection using Tarjan's SCC algorithm.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Strongly connected components with more than one member, or with a
/// self-loop, and the edges that lie inside them.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Members of each cycle, sorted; cycles ordered by first member
    pub cycles: Vec<Vec<String>>,
    /// `(from, to)` pairs whose endpoints share a cycle
    #[serde(skip)]
    pub circular_edges: HashSet<(String, String)>,
}

impl CycleReport {
    pub fn is_circular(&self, from: &str, to: &str) -> bool {
        self.circular_edges.contains(&(from.to_string(), to.to_string()))
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Files participating in any cycle.
    pub fn members(&self) -> BTreeSet<&str> {
        self.cycles.iter().flatten().map(|s| s.as_str()).collect()
    }
}

/// Detect cycles among directed `(from, to)` edges.
pub fn detect_cycles<'a, I>(edges: I) -> CycleReport
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    let mut pairs: Vec<(&str, &str)> = Vec::new();

    for (from, to) in edges {
        let a = *index.entry(from).or_insert_with(|| graph.add_node(from));
        let b = *index.entry(to).or_insert_with(|| graph.add_node(to));
        graph.update_edge(a, b, ());
        pairs.push((from, to));
    }

    let mut component_of: HashMap<&str, usize> = HashMap::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .map(|&n| graph.contains_edge(n, n))
                .unwrap_or(false);
        if !cyclic {
            continue;
        }
        let mut members: Vec<String> = component.iter().map(|&n| graph[n].to_string()).collect();
        members.sort();
        for &n in &component {
            component_of.insert(graph[n], cycles.len());
        }
        cycles.push(members);
    }

    let circular_edges = pairs
        .into_iter()
        .filter(|(from, to)| match (component_of.get(from), component_of.get(to)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        })
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

    cycles.sort();
    tracing::debug!(cycles = cycles.len(), "cycle detection finished");
    CycleReport {
        cycles,
        circular_edges,
    }
}
