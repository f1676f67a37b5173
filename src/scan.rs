//! Directory collection for pipeline input.
//!
//! Filtering precedence:
//! 1. Hard internal ignores (VCS metadata, build output, dependency dirs)
//! 2. Gitignore-style rules (.gitignore, .ignore), when enabled
//! 3. Include globs (if any)
//! 4. Exclude globs
//!
//! Only files with a recognised source extension are returned. Output is
//! sorted by path so repeated scans of the same tree agree.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::error::{CkgError, Result};
use crate::ingest::detect_language;
use crate::input::FileInput;

/// Directories that are never descended into.
const INTERNAL_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "target",
    "node_modules",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
];

/// Compiled filter rules for one root.
pub struct FileFilter {
    root: PathBuf,
    gitignore: Option<Gitignore>,
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl FileFilter {
    pub fn new(root: &Path, config: &ScanConfig) -> Result<Self> {
        let gitignore = if config.respect_gitignore {
            Some(load_gitignore(root)?)
        } else {
            None
        };
        let include = if config.include.is_empty() {
            None
        } else {
            Some(compile_globs(&config.include)?)
        };
        Ok(Self {
            root: root.to_path_buf(),
            gitignore,
            include,
            exclude: compile_globs(&config.exclude)?,
        })
    }

    /// Whether `path` (a file under the root) passes every rule.
    pub fn accepts(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.components().any(|c| is_internal_dir(&c.as_os_str().to_string_lossy())) {
            return false;
        }
        if detect_language(path).is_none() {
            return false;
        }
        if let Some(gitignore) = &self.gitignore {
            if gitignore.matched_path_or_any_parents(relative, false).is_ignore() {
                return false;
            }
        }
        if let Some(include) = &self.include {
            if !include.is_match(relative) {
                return false;
            }
        }
        !self.exclude.is_match(relative)
    }
}

impl std::fmt::Debug for FileFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileFilter")
            .field("root", &self.root)
            .field("gitignore", &self.gitignore.is_some())
            .field("include", &self.include.as_ref().map(GlobSet::len))
            .field("exclude", &self.exclude.len())
            .finish()
    }
}

fn is_internal_dir(name: &str) -> bool {
    INTERNAL_IGNORE_DIRS.contains(&name)
}

fn load_gitignore(root: &Path) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for name in [".gitignore", ".ignore"] {
        let path = root.join(name);
        if path.exists() {
            if let Some(err) = builder.add(&path) {
                // Malformed ignore files are skipped
                tracing::warn!(path = %path.display(), error = %err, "failed to load ignore file");
            }
        }
    }
    builder
        .build()
        .map_err(|e| CkgError::InvalidConfig(format!("ignore rules: {}", e)))
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| CkgError::InvalidConfig(format!("invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CkgError::InvalidConfig(format!("glob set: {}", e)))
}

fn descend(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !entry.file_type().is_dir() || !is_internal_dir(&entry.file_name().to_string_lossy())
}

/// Collect every supported source file under `root` as a lazily-read
/// [`FileInput`]. Paths are relative to `root` with `/` separators.
pub fn collect_source_files(root: &Path, config: &ScanConfig) -> Result<Vec<FileInput>> {
    if !root.is_dir() {
        return Err(CkgError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "scan root is not a directory"),
        });
    }
    let filter = FileFilter::new(root, config)?;

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(descend)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !filter.accepts(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        found.push((normalize(relative), entry.path().to_path_buf()));
    }
    found.sort();

    tracing::debug!(root = %root.display(), files = found.len(), "collected source files");
    Ok(found
        .into_iter()
        .map(|(relative, absolute)| FileInput::located(relative, absolute))
        .collect())
}

fn normalize(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn paths(files: &[FileInput]) -> Vec<&str> {
        files.iter().map(|f| f.file_path.as_str()).collect()
    }

    #[test]
    fn test_collects_supported_files_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.py", "x = 1\n");
        write(dir.path(), "src/a.rs", "fn a() {}\n");
        write(dir.path(), "notes.txt", "hello\n");
        write(dir.path(), "node_modules/lib/index.js", "module.exports = 1;\n");
        write(dir.path(), "target/debug/gen.rs", "fn g() {}\n");

        let files = collect_source_files(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(paths(&files), vec!["src/a.rs", "src/b.py"]);
        assert_eq!(files[0].read_content().unwrap(), "fn a() {}\n");
    }

    #[test]
    fn test_gitignore_and_globs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "generated/api.ts", "export const a = 1;\n");
        write(dir.path(), "src/app.ts", "export const b = 2;\n");
        write(dir.path(), "src/app.test.ts", "test('x', () => {});\n");
        write(dir.path(), "lib/util.js", "export const c = 3;\n");

        let all = collect_source_files(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(paths(&all), vec!["lib/util.js", "src/app.test.ts", "src/app.ts"]);

        let config = ScanConfig {
            include: vec!["src/**".into()],
            exclude: vec!["**/*.test.ts".into()],
            respect_gitignore: true,
        };
        let filtered = collect_source_files(dir.path(), &config).unwrap();
        assert_eq!(paths(&filtered), vec!["src/app.ts"]);

        let unfiltered = ScanConfig {
            respect_gitignore: false,
            ..ScanConfig::default()
        };
        let with_ignored = collect_source_files(dir.path(), &unfiltered).unwrap();
        assert!(paths(&with_ignored).contains(&"generated/api.ts"));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ScanConfig {
            include: vec!["src/[".into()],
            ..ScanConfig::default()
        };
        let err = collect_source_files(dir.path(), &config).unwrap_err();
        assert!(matches!(err, CkgError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_source_files(&dir.path().join("absent"), &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, CkgError::Io { .. }));
    }
}
