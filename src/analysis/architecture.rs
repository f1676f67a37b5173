//! Layer summaries and layer-violation detection.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::analysis::{Dependency, FileProfile, FileType, Layer};
use crate::common::{file_name, file_stem};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub layer: Layer,
    pub files: Vec<String>,
    pub count: usize,
    pub avg_complexity: f64,
    /// Share of the layer's files with a matching test file, 0.0..=1.0
    pub test_coverage: f64,
}

/// A dependency pointing upward: from a deeper layer to a shallower one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayerViolation {
    pub from: String,
    pub to: String,
    pub from_layer: Layer,
    pub to_layer: Layer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureReport {
    /// One entry per concrete layer plus `unknown`, in stack order
    pub layers: Vec<LayerSummary>,
    pub violations: Vec<LayerViolation>,
}

/// Stem of the file a test file exercises: `auth.test.js` → `auth`,
/// `test_auth.py` → `auth`, `AuthTest.java` → `auth`.
pub fn test_subject(path: &str) -> Option<String> {
    let name = file_name(path);
    let stem = file_stem(path);
    let subject = if let Some(idx) = name.find(".test.").or_else(|| name.find(".spec.")) {
        &name[..idx]
    } else if let Some(rest) = stem.strip_prefix("test_") {
        rest
    } else if let Some(rest) = stem.strip_suffix("_test") {
        rest
    } else if let Some(rest) = stem.strip_suffix("Test").filter(|r| !r.is_empty()) {
        rest
    } else {
        return None;
    };
    Some(subject.to_ascii_lowercase())
}

/// Mark `has_test` on every non-test profile whose stem some test exercises.
pub fn mark_tested(profiles: &mut [FileProfile]) {
    let subjects: HashSet<String> = profiles
        .iter()
        .filter(|p| p.file_type == FileType::Test)
        .filter_map(|p| test_subject(&p.path))
        .collect();
    for profile in profiles.iter_mut() {
        profile.has_test = profile.file_type != FileType::Test
            && subjects.contains(&file_stem(&profile.path).to_ascii_lowercase());
    }
}

pub fn summarize_layers(profiles: &[FileProfile]) -> Vec<LayerSummary> {
    let mut layers: Vec<Layer> = Layer::ORDERED.to_vec();
    layers.push(Layer::Unknown);

    layers
        .into_iter()
        .map(|layer| {
            let members: Vec<&FileProfile> = profiles
                .iter()
                .filter(|p| p.layer == layer && p.file_type != FileType::Test)
                .collect();
            let count = members.len();
            let (avg_complexity, test_coverage) = if count == 0 {
                (0.0, 0.0)
            } else {
                let complexity: usize = members.iter().map(|p| p.complexity).sum();
                let tested = members.iter().filter(|p| p.has_test).count();
                (complexity as f64 / count as f64, tested as f64 / count as f64)
            };
            LayerSummary {
                layer,
                files: members.iter().map(|p| p.path.clone()).collect(),
                count,
                avg_complexity,
                test_coverage,
            }
        })
        .collect()
}

/// Internal dependencies whose source sits deeper than their target.
pub fn find_violations(profiles: &[FileProfile], dependencies: &[Dependency]) -> Vec<LayerViolation> {
    let layer_of: HashMap<&str, Layer> = profiles.iter().map(|p| (p.path.as_str(), p.layer)).collect();
    let mut violations = Vec::new();
    for dependency in dependencies.iter().filter(|d| !d.external) {
        let (Some(&from_layer), Some(&to_layer)) =
            (layer_of.get(dependency.from.as_str()), layer_of.get(dependency.to.as_str()))
        else {
            continue;
        };
        if let (Some(from_depth), Some(to_depth)) = (from_layer.depth(), to_layer.depth()) {
            if from_depth > to_depth {
                violations.push(LayerViolation {
                    from: dependency.from.clone(),
                    to: dependency.to.clone(),
                    from_layer,
                    to_layer,
                });
            }
        }
    }
    violations
}

pub fn analyze_architecture(profiles: &[FileProfile], dependencies: &[Dependency]) -> ArchitectureReport {
    ArchitectureReport {
        layers: summarize_layers(profiles),
        violations: find_violations(profiles, dependencies),
    }
}
