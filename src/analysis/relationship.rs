//! Relationship typing and strength scoring for file dependencies.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::classify::FileType;
use crate::graph::Relationship;
use crate::ingest::{ImportFact, ImportKind};

/// Bucketed dependency significance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStrength {
    Weak,
    Medium,
    Strong,
    Critical,
}

impl RelationshipStrength {
    /// `<1.5` weak, `<3` medium, `<5` strong, else critical.
    pub fn from_score(score: f64) -> Self {
        if score < 1.5 {
            RelationshipStrength::Weak
        } else if score < 3.0 {
            RelationshipStrength::Medium
        } else if score < 5.0 {
            RelationshipStrength::Strong
        } else {
            RelationshipStrength::Critical
        }
    }
}

/// Path keywords marking a dependency as on a critical path.
const CRITICAL_PATH_KEYWORDS: &[&str] = &[
    "auth", "login", "payment", "checkout", "billing", "security", "session", "token",
];

/// Score contribution per usage, capped at `USAGE_CAP` usages.
const USAGE_WEIGHT: f64 = 0.5;
const USAGE_CAP: usize = 10;
const CONDITIONAL_FACTOR: f64 = 0.6;
const CRITICAL_BONUS: f64 = 1.5;

/// Inputs for one file → dependency pair.
#[derive(Debug, Clone)]
pub struct DependencyContext<'a> {
    pub import: &'a ImportFact,
    pub from_type: FileType,
    /// `None` for external packages
    pub to_type: Option<FileType>,
    pub external: bool,
}

/// Relationship by fixed priority: external, dynamic, type-only, same-type
/// composition, service, utility, config, then plain import.
pub fn classify_relationship(ctx: &DependencyContext<'_>) -> Relationship {
    if ctx.external {
        return Relationship::ExternalImport;
    }
    match ctx.import.kind {
        ImportKind::Dynamic => return Relationship::DynamicImport,
        ImportKind::TypeOnly => return Relationship::TypeImport,
        _ => {}
    }
    match ctx.to_type {
        Some(to) if to == ctx.from_type && to != FileType::File => Relationship::Composition,
        Some(FileType::Service) => Relationship::ServiceCall,
        Some(FileType::Utility) => Relationship::UtilityUsage,
        Some(FileType::Config) => Relationship::ConfigUsage,
        _ => Relationship::Import,
    }
}

fn import_kind_weight(kind: ImportKind) -> f64 {
    match kind {
        ImportKind::Static | ImportKind::Include | ImportKind::Require => 1.0,
        ImportKind::Dynamic => 0.75,
        ImportKind::TypeOnly => 0.5,
    }
}

/// Weighted score: usage term plus import-kind term, reduced for
/// conditional imports and boosted on critical paths.
pub fn strength_score(usage_count: usize, kind: ImportKind, conditional: bool, critical_path: bool) -> f64 {
    let mut score = usage_count.min(USAGE_CAP) as f64 * USAGE_WEIGHT + import_kind_weight(kind);
    if conditional {
        score *= CONDITIONAL_FACTOR;
    }
    if critical_path {
        score += CRITICAL_BONUS;
    }
    score
}

/// True when the dependency target's path names a sensitive concern.
pub fn is_critical_path(to: &str) -> bool {
    let to = to.to_ascii_lowercase();
    CRITICAL_PATH_KEYWORDS.iter().any(|k| to.contains(k))
}

/// Occurrences of the imported names outside the import statement's lines.
///
/// Wildcard and bare imports count once.
pub fn usage_count(content: &str, import: &ImportFact) -> usize {
    let names: Vec<&str> = import
        .imported_names
        .iter()
        .map(|n| n.as_str())
        .filter(|n| *n != "*" && !n.is_empty())
        .collect();
    if names.is_empty() {
        return 1;
    }

    let alternation = names.iter().map(|n| regex::escape(n)).collect::<Vec<_>>().join("|");
    let pattern = match Regex::new(&format!(r"\b(?:{})\b", alternation)) {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::debug!(error = %e, "usage pattern rejected, assuming one use");
            return 1;
        }
    };

    content
        .lines()
        .enumerate()
        .filter(|(idx, _)| !import.spans_line(idx + 1))
        .map(|(_, line)| pattern.find_iter(line).count())
        .sum()
}
