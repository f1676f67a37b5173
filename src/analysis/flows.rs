//! Flow tracing: bounded DFS from entry points over flow-relevant edges.
//!
//! Flows are derived data. Each run recomputes them from the dependency
//! list; nothing is carried over between runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analysis::{Dependency, FileProfile};
use crate::common::{file_name, file_stem, stable_id};
use crate::config::AnalysisConfig;
use crate::graph::Relationship;

const API_CALL_KEYWORDS: &[&str] = &[
    "fetch(", "axios", "XMLHttpRequest", "http.get", "http.post", "requests.", "HttpClient", "reqwest",
];
const STATE_KEYWORDS: &[&str] = &[
    "useState", "setState", "useReducer", "dispatch(", "this.state", "store.", "commit(", "localStorage.",
];
const INTERACTION_KEYWORDS: &[&str] = &[
    "onClick", "onSubmit", "onChange", "onPress", "addEventListener", "handleSubmit", "input(",
];
const ASYNC_KEYWORDS: &[&str] = &["async ", "await ", ".then(", "Promise", "tokio::"];

/// Flow categories, first match wins.
const FLOW_CATEGORIES: &[(&str, &[&str])] = &[
    ("authentication", &["auth", "login", "logout", "signin", "signup", "register", "session", "password"]),
    ("payment", &["payment", "checkout", "billing", "cart", "invoice", "order"]),
    ("user-management", &["user", "profile", "account", "settings"]),
    ("search", &["search", "filter", "query"]),
    ("navigation", &["router", "route", "navigation", "menu"]),
    ("data-management", &["crud", "repository", "store", "model", "database"]),
];

/// Categories whose flows are always critical.
const CRITICAL_CATEGORIES: &[&str] = &["authentication", "payment"];

/// Content-level behaviour flags of one file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    pub is_async: bool,
    pub has_state_change: bool,
    pub has_api_call: bool,
    pub has_user_interaction: bool,
}

impl Behavior {
    pub fn of(content: &str) -> Self {
        let any = |keywords: &[&str]| keywords.iter().any(|k| content.contains(k));
        Self {
            is_async: any(ASYNC_KEYWORDS),
            has_state_change: any(STATE_KEYWORDS),
            has_api_call: any(API_CALL_KEYWORDS),
            has_user_interaction: any(INTERACTION_KEYWORDS),
        }
    }

    /// Dominant action label, most user-facing first.
    pub fn action(&self, profile: &FileProfile) -> &'static str {
        use crate::analysis::FileType;
        if self.has_user_interaction {
            "user-interaction"
        } else if self.has_api_call {
            "api-call"
        } else if self.has_state_change {
            "state-change"
        } else {
            match profile.file_type {
                FileType::Component | FileType::Page => "render",
                FileType::Hook => "state-change",
                FileType::Service => "service-call",
                FileType::Model => "data-access",
                FileType::Utility => "utility",
                FileType::Config => "configure",
                _ => "process",
            }
        }
    }
}

/// One file visited by a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub order: usize,
    pub file: String,
    pub action: String,
    /// Flow-relevant dependencies of this file
    pub dependencies: Vec<String>,
    #[serde(flatten)]
    pub behavior: Behavior,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowClassification {
    pub is_critical: bool,
    pub category: String,
}

/// A traced usage path from an entry point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub id: String,
    pub name: String,
    pub entry_point: String,
    /// Files in visit order, each once
    pub files: Vec<String>,
    pub steps: Vec<FlowStep>,
    pub classification: FlowClassification,
}

/// Entry points: explicitly flagged, or named `app.*`, `main.*`, `index.*`,
/// or with `route`/`page` in the path. Tests are never entry points.
pub fn is_entry_point(path: &str, flagged: bool) -> bool {
    if flagged {
        return true;
    }
    let lower = path.replace('\\', "/").to_ascii_lowercase();
    if lower.contains(".test.") || lower.contains(".spec.") {
        return false;
    }
    let name = file_name(&lower);
    name.starts_with("app.")
        || name.starts_with("main.")
        || name.starts_with("index.")
        || lower.contains("route")
        || lower.contains("page")
}

/// Edges worth following: internal, and not type-only or config reads.
fn is_flow_relevant(dependency: &Dependency) -> bool {
    !dependency.external
        && !matches!(
            dependency.relationship,
            Relationship::TypeImport | Relationship::ConfigUsage | Relationship::ExternalImport
        )
}

/// Category from the files' paths; `general` when nothing matches.
pub fn classify_flow(files: &[String]) -> FlowClassification {
    let haystack = files.join(" ").to_ascii_lowercase();
    let category = FLOW_CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or("general");
    FlowClassification {
        is_critical: CRITICAL_CATEGORIES.contains(&category),
        category: category.to_string(),
    }
}

/// Trace one flow per entry point, discarding flows below the minimum size.
pub fn trace_flows(profiles: &[FileProfile], dependencies: &[Dependency], config: &AnalysisConfig) -> Vec<Flow> {
    // BTreeMap keeps neighbour order deterministic
    let mut adjacency: BTreeMap<&str, Vec<(usize, &str)>> = BTreeMap::new();
    for dependency in dependencies.iter().filter(|d| is_flow_relevant(d)) {
        adjacency
            .entry(dependency.from.as_str())
            .or_default()
            .push((dependency.line, dependency.to.as_str()));
    }
    for targets in adjacency.values_mut() {
        targets.sort();
        let mut seen = HashSet::new();
        targets.retain(|(_, to)| seen.insert(*to));
    }

    let by_path: HashMap<&str, &FileProfile> = profiles.iter().map(|p| (p.path.as_str(), p)).collect();

    let mut flows = Vec::new();
    for entry in profiles.iter().filter(|p| p.is_entry_point) {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut order: Vec<&str> = Vec::new();
        visit(entry.path.as_str(), 0, config.max_flow_depth, &adjacency, &mut visited, &mut order);

        if order.len() < config.min_flow_files {
            tracing::trace!(entry = %entry.path, files = order.len(), "flow too short, discarded");
            continue;
        }

        let files: Vec<String> = order.iter().map(|s| s.to_string()).collect();
        let steps = order
            .iter()
            .enumerate()
            .filter_map(|(i, path)| {
                let profile = by_path.get(path)?;
                let dependencies = adjacency
                    .get(path)
                    .map(|targets| targets.iter().map(|(_, to)| to.to_string()).collect())
                    .unwrap_or_default();
                Some(FlowStep {
                    order: i + 1,
                    file: path.to_string(),
                    action: profile.behavior.action(profile).to_string(),
                    dependencies,
                    behavior: profile.behavior,
                })
            })
            .collect();
        let classification = classify_flow(&files);

        flows.push(Flow {
            id: stable_id(&["flow", &entry.path]),
            name: format!("{} flow", file_stem(&entry.path)),
            entry_point: entry.path.clone(),
            files,
            steps,
            classification,
        });
    }
    flows
}

fn visit<'a>(
    file: &'a str,
    depth: usize,
    max_depth: usize,
    adjacency: &BTreeMap<&'a str, Vec<(usize, &'a str)>>,
    visited: &mut HashSet<&'a str>,
    order: &mut Vec<&'a str>,
) {
    if depth > max_depth || !visited.insert(file) {
        return;
    }
    order.push(file);
    if let Some(targets) = adjacency.get(file) {
        for &(_, next) in targets {
            visit(next, depth + 1, max_depth, adjacency, visited, order);
        }
    }
}
