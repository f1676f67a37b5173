//! Project-wide dependency analysis.
//!
//! Consumes per-file extractions, resolves imports to files, types and
//! scores each dependency, then derives cycles, architecture, flows,
//! quality and performance summaries. Classification never fails; only
//! file extraction can produce errors, and those are collected.

pub mod architecture;
pub mod classify;
pub mod cycles;
pub mod flows;
pub mod quality;
pub mod relationship;
pub mod resolve;

pub use architecture::{ArchitectureReport, LayerSummary, LayerViolation};
pub use classify::{classify_file_type, classify_layer, estimate_complexity, FileType, Layer};
pub use cycles::{detect_cycles, CycleReport};
pub use flows::{Behavior, Flow, FlowClassification, FlowStep};
pub use quality::{Coupling, PerformanceReport, QualityReport};
pub use relationship::RelationshipStrength;
pub use resolve::{ModuleResolver, Resolution};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AnalysisConfig, CkgConfig};
use crate::error::FileError;
use crate::graph::extract::{FileExtraction, SymbolExtractor};
use crate::graph::Relationship;
use crate::ingest::Language;
use crate::input::FileInput;
use relationship::{classify_relationship, is_critical_path, strength_score, usage_count, DependencyContext};

/// Per-file classification used by every analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileProfile {
    pub path: String,
    pub file_type: FileType,
    pub layer: Layer,
    pub language: Option<Language>,
    pub lines: usize,
    pub complexity: usize,
    pub is_entry_point: bool,
    /// A test file exercises this file
    pub has_test: bool,
    pub behavior: Behavior,
}

impl FileProfile {
    pub fn of(extraction: &FileExtraction) -> Self {
        let path = extraction.path.as_str();
        let content = extraction.content.as_str();
        Self {
            path: path.to_string(),
            file_type: classify_file_type(path, content),
            layer: classify_layer(path, content),
            language: extraction.language,
            lines: content.lines().count(),
            complexity: estimate_complexity(content),
            is_entry_point: flows::is_entry_point(path, extraction.entry_point),
            has_test: false,
            behavior: Behavior::of(content),
        }
    }
}

/// One import, typed and scored. `to` is a file path for internal
/// dependencies and a package name for external ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub from: String,
    pub to: String,
    pub relationship: Relationship,
    pub strength: RelationshipStrength,
    pub score: f64,
    pub usage_count: usize,
    pub line: usize,
    pub imported_names: Vec<String>,
    pub is_conditional: bool,
    pub is_circular: bool,
    pub external: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub files: Vec<FileProfile>,
    pub dependencies: Vec<Dependency>,
    pub architecture: ArchitectureReport,
    pub user_flows: Vec<Flow>,
    pub performance: PerformanceReport,
    pub quality: QualityReport,
    pub errors: Vec<FileError>,
}

impl AnalysisReport {
    pub fn internal_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| !d.external)
    }

    /// Paths of files some test file exercises.
    pub fn tested_files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().filter(|f| f.has_test).map(|f| f.path.as_str())
    }
}

/// Runs the project-wide pass.
#[derive(Debug, Clone)]
pub struct DependencyAnalyzer {
    extractor: Arc<SymbolExtractor>,
    config: AnalysisConfig,
    project_id: String,
}

impl DependencyAnalyzer {
    pub fn new(config: &CkgConfig) -> Self {
        Self::with_extractor(Arc::new(SymbolExtractor::from_config(config)), config)
    }

    /// Share an extractor (and its symbol cache) with other stages.
    pub fn with_extractor(extractor: Arc<SymbolExtractor>, config: &CkgConfig) -> Self {
        Self {
            extractor,
            config: config.analysis.clone(),
            project_id: config.project_id.clone(),
        }
    }

    /// Extract every file, then analyse the ones that succeeded.
    ///
    /// Files that fail to load or parse are reported in `errors` and left
    /// out of every other section.
    pub fn analyze_dependencies(&self, files: &[FileInput]) -> AnalysisReport {
        let mut extractions = Vec::with_capacity(files.len());
        let mut errors = Vec::new();
        for input in files {
            match self.extractor.extract_from_file(input, &self.project_id, None) {
                Ok(extraction) => extractions.push(extraction),
                Err(e) => {
                    tracing::warn!(path = %input.file_path, error = %e, "skipping file in analysis");
                    errors.push(FileError::from_error(input.file_path.clone(), &e));
                }
            }
        }
        let mut report = self.analyze_extractions(&extractions);
        report.errors = errors;
        report
    }

    pub fn analyze_extractions(&self, extractions: &[FileExtraction]) -> AnalysisReport {
        let started = Instant::now();

        let mut profiles: Vec<FileProfile> = extractions.iter().map(FileProfile::of).collect();
        architecture::mark_tested(&mut profiles);

        let (mut dependencies, unresolved) = self.resolve_dependencies(extractions, &profiles);

        let cycles = detect_cycles(
            dependencies
                .iter()
                .filter(|d| !d.external)
                .map(|d| (d.from.as_str(), d.to.as_str())),
        );
        for dependency in dependencies.iter_mut().filter(|d| !d.external) {
            dependency.is_circular = cycles.is_circular(&dependency.from, &dependency.to);
        }

        let architecture = architecture::analyze_architecture(&profiles, &dependencies);
        let user_flows = flows::trace_flows(&profiles, &dependencies, &self.config);
        let quality = quality::assess_quality(
            &profiles,
            &dependencies,
            &cycles,
            architecture.violations.len(),
            &self.config,
        );
        let duration_ms = started.elapsed().as_millis() as u64;
        let performance =
            quality::measure_performance(&profiles, &dependencies, unresolved, &self.config, duration_ms);

        tracing::debug!(
            files = profiles.len(),
            dependencies = dependencies.len(),
            cycles = cycles.cycles.len(),
            flows = user_flows.len(),
            "dependency analysis finished"
        );

        AnalysisReport {
            files: profiles,
            dependencies,
            architecture,
            user_flows,
            performance,
            quality,
            errors: Vec::new(),
        }
    }

    /// Resolve and score every import. Returns the dependencies and the
    /// number of imports that looked local but matched no file.
    fn resolve_dependencies(
        &self,
        extractions: &[FileExtraction],
        profiles: &[FileProfile],
    ) -> (Vec<Dependency>, usize) {
        let resolver = ModuleResolver::new(extractions.iter().map(|e| e.path.as_str()));
        let type_of: HashMap<&str, FileType> =
            profiles.iter().map(|p| (p.path.as_str(), p.file_type)).collect();

        let mut dependencies = Vec::new();
        let mut unresolved = 0;
        for extraction in extractions {
            let from_type = type_of
                .get(extraction.path.as_str())
                .copied()
                .unwrap_or(FileType::File);
            for import in &extraction.symbols.imports {
                let (to, external) = match resolver.resolve(&extraction.path, extraction.language, import) {
                    Resolution::Internal(path) => (path, false),
                    Resolution::External(package) => (package, true),
                    Resolution::Unresolved => {
                        tracing::trace!(
                            path = %extraction.path,
                            specifier = %import.specifier,
                            "import did not resolve"
                        );
                        unresolved += 1;
                        continue;
                    }
                };

                let to_type = if external { None } else { type_of.get(to.as_str()).copied() };
                let relationship = classify_relationship(&DependencyContext {
                    import,
                    from_type,
                    to_type,
                    external,
                });
                let usage = usage_count(&extraction.content, import);
                let score = strength_score(usage, import.kind, import.is_conditional, is_critical_path(&to));

                dependencies.push(Dependency {
                    from: extraction.path.clone(),
                    to,
                    relationship,
                    strength: RelationshipStrength::from_score(score),
                    score,
                    usage_count: usage,
                    line: import.line,
                    imported_names: import.imported_names.clone(),
                    is_conditional: import.is_conditional,
                    is_circular: false,
                    external,
                });
            }
        }
        (dependencies, unresolved)
    }
}
