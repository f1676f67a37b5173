//! Dependency analysis: cycles, strength buckets and classification tables.

use meridian::analysis::relationship::strength_score;
use meridian::analysis::{classify_file_type, classify_layer, detect_cycles, RelationshipStrength};
use meridian::ingest::ImportKind;
use meridian::{CkgConfig, DependencyAnalyzer, FileInput, FileType, Layer, Relationship};
use pretty_assertions::assert_eq;

fn module(path: &str, imports: &str, name: &str) -> FileInput {
    FileInput::with_content(
        path,
        format!("import {{ {imports} }} from './{imports}';\nexport function {name}() {{ return {imports}(); }}\n"),
    )
}

#[test]
fn test_three_file_cycle_flags_every_edge() {
    let files = vec![
        module("src/a.js", "b", "a"),
        module("src/b.js", "c", "b"),
        module("src/c.js", "a", "c"),
    ];
    let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_dependencies(&files);

    let internal: Vec<_> = report.internal_dependencies().collect();
    assert_eq!(internal.len(), 3);
    assert!(internal.iter().all(|d| d.is_circular));
    assert_eq!(
        report.quality.circular_dependencies,
        vec![vec!["src/a.js".to_string(), "src/b.js".to_string(), "src/c.js".to_string()]]
    );
}

#[test]
fn test_acyclic_chain_flags_nothing() {
    let files = vec![
        module("src/a.js", "b", "a"),
        module("src/b.js", "c", "b"),
        FileInput::with_content("src/c.js", "export function c() { return 1; }\n"),
    ];
    let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_dependencies(&files);

    let internal: Vec<_> = report.internal_dependencies().collect();
    assert_eq!(internal.len(), 2);
    assert!(internal.iter().all(|d| !d.is_circular));
    assert!(report.quality.circular_dependencies.is_empty());
}

#[test]
fn test_cycle_detection_on_raw_edges() {
    let report = detect_cycles(vec![("x", "y"), ("y", "x"), ("y", "z"), ("self", "self")]);
    assert!(report.is_circular("x", "y"));
    assert!(report.is_circular("y", "x"));
    assert!(!report.is_circular("y", "z"));
    assert!(report.is_circular("self", "self"));
}

#[test]
fn test_strength_monotonic_in_usage() {
    for kind in [ImportKind::Static, ImportKind::Dynamic, ImportKind::TypeOnly] {
        for conditional in [false, true] {
            for critical in [false, true] {
                let buckets: Vec<RelationshipStrength> = (0..30)
                    .map(|usage| RelationshipStrength::from_score(strength_score(usage, kind, conditional, critical)))
                    .collect();
                assert!(
                    buckets.windows(2).all(|w| w[0] <= w[1]),
                    "non-monotonic for {:?} conditional={} critical={}: {:?}",
                    kind,
                    conditional,
                    critical,
                    buckets
                );
            }
        }
    }
}

#[test]
fn test_strength_thresholds() {
    assert_eq!(RelationshipStrength::from_score(1.49), RelationshipStrength::Weak);
    assert_eq!(RelationshipStrength::from_score(1.5), RelationshipStrength::Medium);
    assert_eq!(RelationshipStrength::from_score(3.0), RelationshipStrength::Strong);
    assert_eq!(RelationshipStrength::from_score(5.0), RelationshipStrength::Critical);
}

#[test]
fn test_classification_has_fallbacks() {
    assert_eq!(classify_file_type("notes/whatever.xyz", ""), FileType::File);
    assert_eq!(classify_layer("notes/whatever.xyz", ""), Layer::Unknown);
    assert_eq!(classify_file_type("src/app.test.ts", ""), FileType::Test);
}

#[test]
fn test_external_packages_typed_external() {
    let files = vec![FileInput::with_content(
        "src/index.ts",
        "import express from 'express';\nexport const app = express();\n",
    )];
    let report = DependencyAnalyzer::new(&CkgConfig::default()).analyze_dependencies(&files);
    assert_eq!(report.dependencies.len(), 1);
    assert!(report.dependencies[0].external);
    assert_eq!(report.dependencies[0].relationship, Relationship::ExternalImport);
}
