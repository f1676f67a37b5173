//! Import specifier resolution against the set of analysed files.
//!
//! Handles:
//! - ECMAScript relative specifiers with extension and `index` probing
//! - Python relative (`.models`) and dotted absolute modules
//! - Rust `crate::`, `super::` and `self::` module paths
//! - Java dotted class names
//! - C/C++ local includes, falling back to a file-name match

use std::collections::{HashMap, HashSet};

use crate::common::{file_name, normalize_separators};
use crate::ingest::{ImportFact, Language};

const ECMASCRIPT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".mts", ".cts"];

/// Where an import points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A file in the analysed set
    Internal(String),
    /// A package outside the project, by package name
    External(String),
    /// Looks project-local but no file matched
    Unresolved,
}

/// Index of analysed file paths by module name.
#[derive(Debug, Default)]
pub struct ModuleResolver {
    files: HashSet<String>,
    /// `crate::foo::bar` → `src/foo/bar.rs`
    rust_modules: HashMap<String, String>,
    /// Dotted module suffixes (`services.auth`) → path, per extension family
    dotted: HashMap<(DottedFamily, String), String>,
    /// Bare file name → paths, for include search
    by_name: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DottedFamily {
    Python,
    Java,
}

impl ModuleResolver {
    /// Build the index. Paths are normalized to `/` separators.
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut sorted: Vec<String> = paths.into_iter().map(normalize_separators).collect();
        sorted.sort();
        sorted.dedup();

        let mut resolver = ModuleResolver::default();
        for path in sorted {
            if path.ends_with(".rs") {
                resolver
                    .rust_modules
                    .entry(rust_module_path(&path))
                    .or_insert_with(|| path.clone());
            }
            if let Some(module) = path.strip_suffix(".py") {
                let module = module.strip_suffix("/__init__").unwrap_or(module);
                resolver.index_dotted(DottedFamily::Python, module, &path);
            }
            if let Some(module) = path.strip_suffix(".java") {
                resolver.index_dotted(DottedFamily::Java, module, &path);
            }
            resolver
                .by_name
                .entry(file_name(&path).to_string())
                .or_default()
                .push(path.clone());
            resolver.files.insert(path);
        }
        resolver
    }

    /// Every suffix of the module path, shortest path wins on collision.
    fn index_dotted(&mut self, family: DottedFamily, module: &str, path: &str) {
        let segments: Vec<&str> = module.split('/').filter(|s| !s.is_empty()).collect();
        for start in 0..segments.len() {
            let dotted = segments[start..].join(".");
            self.dotted
                .entry((family, dotted))
                .and_modify(|existing| {
                    if path.len() < existing.len() {
                        *existing = path.to_string();
                    }
                })
                .or_insert_with(|| path.to_string());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    /// Resolve one import of `importer`. An import that resolves to the
    /// importer itself is `Unresolved`.
    pub fn resolve(&self, importer: &str, language: Option<Language>, import: &ImportFact) -> Resolution {
        let importer = normalize_separators(importer);
        let resolution = match language {
            Some(language) if language.is_ecmascript() => self.resolve_ecmascript(&importer, &import.specifier),
            Some(Language::Python) => self.resolve_python(&importer, &import.specifier),
            Some(Language::Rust) => self.resolve_rust(&importer, &import.specifier),
            Some(Language::Java) => self.resolve_java(&import.specifier),
            Some(Language::C) | Some(Language::Cpp) => self.resolve_include(&importer, &import.specifier),
            _ => Resolution::Unresolved,
        };
        match resolution {
            Resolution::Internal(path) if path == importer => Resolution::Unresolved,
            other => other,
        }
    }

    fn resolve_ecmascript(&self, importer: &str, specifier: &str) -> Resolution {
        let base = if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." {
            join_relative(parent_dir(importer), specifier)
        } else if let Some(rest) = specifier.strip_prefix('/') {
            rest.to_string()
        } else if let Some(rest) = specifier.strip_prefix("@/").or_else(|| specifier.strip_prefix("~/")) {
            let aliased = [format!("src/{}", rest), rest.to_string()];
            return aliased
                .iter()
                .find_map(|candidate| self.probe_ecmascript(candidate))
                .map(Resolution::Internal)
                .unwrap_or(Resolution::Unresolved);
        } else {
            return Resolution::External(package_name(specifier));
        };

        self.probe_ecmascript(&base)
            .map(Resolution::Internal)
            .unwrap_or(Resolution::Unresolved)
    }

    /// `base`, `base.ext`, `base/index.ext`
    fn probe_ecmascript(&self, base: &str) -> Option<String> {
        if self.files.contains(base) {
            return Some(base.to_string());
        }
        for ext in ECMASCRIPT_EXTENSIONS {
            let candidate = format!("{}{}", base, ext);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }
        for ext in ECMASCRIPT_EXTENSIONS {
            let candidate = format!("{}/index{}", base.trim_end_matches('/'), ext);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn resolve_python(&self, importer: &str, specifier: &str) -> Resolution {
        let level = specifier.chars().take_while(|c| *c == '.').count();
        if level == 0 {
            return self
                .lookup_dotted(DottedFamily::Python, specifier)
                .map(Resolution::Internal)
                .unwrap_or_else(|| Resolution::External(first_segment(specifier, '.')));
        }

        // `.` is the importer's package, each further dot one level up
        let mut dir = parent_dir(importer).to_string();
        for _ in 1..level {
            dir = parent_dir(&dir).to_string();
        }
        let rest = specifier[level..].replace('.', "/");
        let base = join_dir(&dir, &rest);
        let candidates = [format!("{}.py", base), format!("{}/__init__.py", base)];
        candidates
            .into_iter()
            .find(|c| self.files.contains(c))
            .map(Resolution::Internal)
            .unwrap_or(Resolution::Unresolved)
    }

    fn resolve_rust(&self, importer: &str, specifier: &str) -> Resolution {
        let segments: Vec<&str> = specifier.split("::").filter(|s| !s.is_empty()).collect();
        let Some(first) = segments.first() else {
            return Resolution::Unresolved;
        };

        let current = rust_module_path(importer);
        let absolute: Vec<String> = match *first {
            "crate" => segments.iter().map(|s| s.to_string()).collect(),
            "self" => std::iter::once(current)
                .chain(segments[1..].iter().map(|s| s.to_string()))
                .collect(),
            "super" => {
                let mut module = current;
                let mut rest = &segments[..];
                while rest.first() == Some(&"super") {
                    module = match module.rfind("::") {
                        Some(pos) => module[..pos].to_string(),
                        None => return Resolution::Unresolved,
                    };
                    rest = &rest[1..];
                }
                std::iter::once(module)
                    .chain(rest.iter().map(|s| s.to_string()))
                    .collect()
            }
            "std" | "core" | "alloc" => return Resolution::External(first.to_string()),
            _ => {
                let candidate = format!("crate::{}", segments.join("::"));
                if !self.rust_modules.contains_key(&format!("crate::{}", first)) {
                    return Resolution::External(first.to_string());
                }
                candidate.split("::").map(|s| s.to_string()).collect()
            }
        };

        // Longest module prefix: `crate::a::b::Item` lives in `crate::a::b`
        for len in (1..=absolute.len()).rev() {
            let module = absolute[..len].join("::");
            if let Some(path) = self.rust_modules.get(&module) {
                return Resolution::Internal(path.clone());
            }
        }
        Resolution::Unresolved
    }

    fn resolve_java(&self, specifier: &str) -> Resolution {
        // `a.b.C` and the static member form `a.b.C.method`
        let mut module = specifier;
        for _ in 0..2 {
            if let Some(path) = self.dotted.get(&(DottedFamily::Java, module.to_string())) {
                return Resolution::Internal(path.clone());
            }
            match module.rfind('.') {
                Some(pos) => module = &module[..pos],
                None => break,
            }
        }
        if specifier.starts_with("java.") || specifier.starts_with("javax.") {
            return Resolution::External(first_segment(specifier, '.'));
        }
        let package: Vec<&str> = specifier.split('.').take(2).collect();
        Resolution::External(package.join("."))
    }

    fn resolve_include(&self, importer: &str, specifier: &str) -> Resolution {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return Resolution::External(specifier.to_string());
        }
        let joined = join_relative(parent_dir(importer), specifier);
        if self.files.contains(&joined) {
            return Resolution::Internal(joined);
        }
        // Include directories are not known; match on the file name alone
        match self.by_name.get(file_name(specifier)) {
            Some(paths) if paths.len() == 1 => Resolution::Internal(paths[0].clone()),
            _ => Resolution::Unresolved,
        }
    }

    fn lookup_dotted(&self, family: DottedFamily, dotted: &str) -> Option<String> {
        self.dotted.get(&(family, dotted.to_string())).cloned()
    }
}

/// `src/lib.rs` → `crate`, `src/foo/mod.rs` → `crate::foo`, `src/foo/bar.rs` → `crate::foo::bar`
pub fn rust_module_path(file_path: &str) -> String {
    let normalized = normalize_separators(file_path);
    let relative = match normalized.rfind("src/") {
        Some(pos) if pos == 0 || normalized[..pos].ends_with('/') => &normalized[pos + 4..],
        _ => normalized.as_str(),
    };
    let stripped = relative.strip_suffix(".rs").unwrap_or(relative);

    let mut segments: Vec<&str> = stripped.split('/').filter(|s| !s.is_empty()).collect();
    if matches!(segments.last(), Some(&"mod") | Some(&"lib") | Some(&"main")) {
        segments.pop();
    }
    if segments.is_empty() {
        "crate".to_string()
    } else {
        format!("crate::{}", segments.join("::"))
    }
}

/// `react-dom/client` → `react-dom`, `@scope/pkg/x` → `@scope/pkg`
fn package_name(specifier: &str) -> String {
    let mut parts = specifier.split('/');
    match parts.next() {
        Some(scope) if scope.starts_with('@') => match parts.next() {
            Some(name) => format!("{}/{}", scope, name),
            None => scope.to_string(),
        },
        Some(name) => name.to_string(),
        None => specifier.to_string(),
    }
}

fn first_segment(specifier: &str, separator: char) -> String {
    specifier.split(separator).next().unwrap_or(specifier).to_string()
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

fn join_dir(dir: &str, rest: &str) -> String {
    match (dir.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => dir.to_string(),
        (false, false) => format!("{}/{}", dir, rest),
    }
}

/// Join a `./`/`../` specifier onto `dir`, folding `.` and `..` segments.
fn join_relative(dir: &str, specifier: &str) -> String {
    let mut stack: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack.join("/")
}
