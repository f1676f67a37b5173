//! Quality and performance summaries over the dependency list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::analysis::{CycleReport, Dependency, FileProfile, FileType};
use crate::config::AnalysisConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Coupling {
    pub file: String,
    pub fan_in: usize,
    pub fan_out: usize,
}

impl Coupling {
    pub fn total(&self) -> usize {
        self.fan_in + self.fan_out
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub circular_dependencies: Vec<Vec<String>>,
    /// Files nothing imports that are not entry points, tests or config
    pub unused_files: Vec<String>,
    pub highly_coupled: Vec<Coupling>,
    pub layer_violations: usize,
    /// 0 (worst) to 100 (best)
    pub maintainability_index: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub file_count: usize,
    pub total_lines: usize,
    pub internal_dependencies: usize,
    pub external_dependencies: usize,
    pub unresolved_imports: usize,
    pub avg_fan_out: f64,
    pub large_files: Vec<String>,
    /// Most-imported files, highest fan-in first
    pub hotspots: Vec<Coupling>,
    pub duration_ms: u64,
}

const HOTSPOT_LIMIT: usize = 5;

/// Fan-in and fan-out per file over internal dependencies, counted once
/// per distinct pair.
pub fn coupling(profiles: &[FileProfile], dependencies: &[Dependency]) -> Vec<Coupling> {
    let mut counts: BTreeMap<&str, (usize, usize)> =
        profiles.iter().map(|p| (p.path.as_str(), (0, 0))).collect();
    let pairs: HashSet<(&str, &str)> = dependencies
        .iter()
        .filter(|d| !d.external)
        .map(|d| (d.from.as_str(), d.to.as_str()))
        .collect();
    for (from, to) in pairs {
        counts.entry(from).or_default().1 += 1;
        counts.entry(to).or_default().0 += 1;
    }
    counts
        .into_iter()
        .map(|(file, (fan_in, fan_out))| Coupling {
            file: file.to_string(),
            fan_in,
            fan_out,
        })
        .collect()
}

fn maintainability(profiles: &[FileProfile], cycles: usize, violations: usize, coupled: usize, unused: usize) -> f64 {
    let measured: Vec<&FileProfile> = profiles.iter().filter(|p| p.file_type != FileType::Test).collect();
    let avg_complexity = if measured.is_empty() {
        1.0
    } else {
        measured.iter().map(|p| p.complexity).sum::<usize>() as f64 / measured.len() as f64
    };
    let penalty = cycles as f64 * 5.0
        + violations as f64 * 2.0
        + coupled as f64 * 3.0
        + unused as f64
        + ((avg_complexity - 1.0) * 2.0).min(20.0);
    (100.0 - penalty).clamp(0.0, 100.0)
}

pub fn assess_quality(
    profiles: &[FileProfile],
    dependencies: &[Dependency],
    cycles: &CycleReport,
    violations: usize,
    config: &AnalysisConfig,
) -> QualityReport {
    let table = coupling(profiles, dependencies);

    let unused_files: Vec<String> = profiles
        .iter()
        .filter(|p| !p.is_entry_point && !matches!(p.file_type, FileType::Test | FileType::Config))
        .filter(|p| table.iter().any(|c| c.file == p.path && c.fan_in == 0))
        .map(|p| p.path.clone())
        .collect();

    let highly_coupled: Vec<Coupling> = table
        .into_iter()
        .filter(|c| c.total() > config.coupling_threshold)
        .collect();

    let maintainability_index = maintainability(
        profiles,
        cycles.cycles.len(),
        violations,
        highly_coupled.len(),
        unused_files.len(),
    );

    QualityReport {
        circular_dependencies: cycles.cycles.clone(),
        unused_files,
        highly_coupled,
        layer_violations: violations,
        maintainability_index,
    }
}

pub fn measure_performance(
    profiles: &[FileProfile],
    dependencies: &[Dependency],
    unresolved_imports: usize,
    config: &AnalysisConfig,
    duration_ms: u64,
) -> PerformanceReport {
    let table = coupling(profiles, dependencies);
    let internal = dependencies.iter().filter(|d| !d.external).count();
    let external = dependencies.len() - internal;
    let avg_fan_out = if profiles.is_empty() {
        0.0
    } else {
        table.iter().map(|c| c.fan_out).sum::<usize>() as f64 / profiles.len() as f64
    };

    let mut hotspots: Vec<Coupling> = table.into_iter().filter(|c| c.fan_in > 0).collect();
    hotspots.sort_by(|a, b| b.fan_in.cmp(&a.fan_in).then_with(|| a.file.cmp(&b.file)));
    hotspots.truncate(HOTSPOT_LIMIT);

    PerformanceReport {
        file_count: profiles.len(),
        total_lines: profiles.iter().map(|p| p.lines).sum(),
        internal_dependencies: internal,
        external_dependencies: external,
        unresolved_imports,
        avg_fan_out,
        large_files: profiles
            .iter()
            .filter(|p| p.lines > config.large_file_lines)
            .map(|p| p.path.clone())
            .collect(),
        hotspots,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cycles::detect_cycles;
    use crate::analysis::flows::Behavior;
    use crate::analysis::{Layer, RelationshipStrength};
    use crate::graph::Relationship;

    fn profile(path: &str, file_type: FileType, lines: usize, entry: bool) -> FileProfile {
        FileProfile {
            path: path.to_string(),
            file_type,
            layer: Layer::Unknown,
            language: None,
            lines,
            complexity: 1,
            is_entry_point: entry,
            has_test: false,
            behavior: Behavior::default(),
        }
    }

    fn dep(from: &str, to: &str, external: bool) -> Dependency {
        Dependency {
            from: from.to_string(),
            to: to.to_string(),
            relationship: if external { Relationship::ExternalImport } else { Relationship::Import },
            strength: RelationshipStrength::Weak,
            score: 1.0,
            usage_count: 1,
            line: 1,
            imported_names: Vec::new(),
            is_conditional: false,
            is_circular: false,
            external,
        }
    }

    #[test]
    fn test_unused_excludes_entries_tests_and_config() {
        let profiles = vec![
            profile("src/index.js", FileType::File, 10, true),
            profile("src/a.js", FileType::File, 10, false),
            profile("src/orphan.js", FileType::File, 10, false),
            profile("src/a.test.js", FileType::Test, 10, false),
            profile("src/config.js", FileType::Config, 10, false),
        ];
        let deps = vec![dep("src/index.js", "src/a.js", false), dep("src/a.js", "react", true)];
        let cycles = detect_cycles(std::iter::empty());
        let report = assess_quality(&profiles, &deps, &cycles, 0, &AnalysisConfig::default());
        assert_eq!(report.unused_files, vec!["src/orphan.js"]);
        assert!(report.highly_coupled.is_empty());
        assert!(report.maintainability_index <= 100.0);
        assert!(report.maintainability_index > 90.0);
    }

    #[test]
    fn test_cycles_and_coupling_lower_maintainability() {
        let mut profiles = vec![profile("hub.js", FileType::File, 10, true)];
        let mut deps = Vec::new();
        for i in 0..12 {
            let leaf = format!("leaf{}.js", i);
            profiles.push(profile(&leaf, FileType::File, 10, false));
            deps.push(dep("hub.js", &leaf, false));
            deps.push(dep(&leaf, "hub.js", false));
        }
        let cycles = detect_cycles(deps.iter().map(|d| (d.from.as_str(), d.to.as_str())));
        let report = assess_quality(&profiles, &deps, &cycles, 3, &AnalysisConfig::default());
        assert_eq!(report.highly_coupled.len(), 1);
        assert_eq!(report.highly_coupled[0].file, "hub.js");
        assert_eq!(report.highly_coupled[0].total(), 24);
        assert_eq!(report.circular_dependencies.len(), 1);
        assert_eq!(report.layer_violations, 3);
        assert!(report.maintainability_index < 95.0);
        assert!(report.maintainability_index >= 0.0);
    }

    #[test]
    fn test_performance_counts() {
        let profiles = vec![
            profile("a.js", FileType::File, 600, true),
            profile("b.js", FileType::File, 40, false),
            profile("c.js", FileType::File, 10, false),
        ];
        let deps = vec![
            dep("a.js", "b.js", false),
            dep("c.js", "b.js", false),
            dep("a.js", "lodash", true),
        ];
        let report = measure_performance(&profiles, &deps, 2, &AnalysisConfig::default(), 7);
        assert_eq!(report.file_count, 3);
        assert_eq!(report.total_lines, 650);
        assert_eq!(report.internal_dependencies, 2);
        assert_eq!(report.external_dependencies, 1);
        assert_eq!(report.unresolved_imports, 2);
        assert_eq!(report.large_files, vec!["a.js"]);
        assert_eq!(report.hotspots[0].file, "b.js");
        assert_eq!(report.hotspots[0].fan_in, 2);
        assert!((report.avg_fan_out - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.duration_ms, 7);
    }
}
