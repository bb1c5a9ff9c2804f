//! Project and file discovery.
//!
//! Discovery is a collaborator of the aggregation driver, not part of the
//! extraction core: anything that yields [`Project`]s can drive an
//! analysis. [`FsScanner`] is the filesystem default, walking the scan
//! root in deterministic sorted order so project and file ordering is
//! reproducible across runs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

use crate::parser::package_json;
use crate::parser::types::PackageJson;

/// One discovered project: a directory owning a package manifest.
#[derive(Debug, Clone)]
pub struct Project {
    /// The project's parsed manifest.
    pub manifest: PackageJson,
    /// Source files belonging to this project, in discovery order.
    pub files: Vec<PathBuf>,
    /// Source identifier of the project (filesystem path of its root).
    pub link: String,
}

impl Project {
    /// The project name, empty when the manifest does not declare one.
    pub fn name(&self) -> &str {
        self.manifest.name.as_deref().unwrap_or_default()
    }
}

/// Yields the projects under a scan root.
pub trait Scanner {
    fn scan(&self, root: &Path) -> anyhow::Result<Vec<Project>>;
}

/// Folder names never descended into, regardless of caller options.
pub const DEFAULT_EXCLUDED_FOLDERS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "coverage",
    ".turbo",
];

/// File extensions scanned when the caller does not narrow the set.
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] =
    &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

/// Filesystem scanner: projects are directories holding a `package.json`,
/// and every source file attaches to its nearest ancestor project.
pub struct FsScanner {
    exclude_folders: Vec<String>,
    include_files: Vec<String>,
}

impl FsScanner {
    pub fn new() -> Self {
        Self::with_options(Vec::new(), Vec::new())
    }

    /// Creates a scanner with caller folder exclusions (added on top of the
    /// defaults) and an extension allow-list (empty means the default
    /// source set).
    pub fn with_options(exclude_folders: Vec<String>, include_files: Vec<String>) -> Self {
        let mut excluded: Vec<String> = DEFAULT_EXCLUDED_FOLDERS
            .iter()
            .map(|s| s.to_string())
            .collect();
        excluded.extend(exclude_folders);

        let include_files = if include_files.is_empty() {
            DEFAULT_SOURCE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            include_files
        };

        Self {
            exclude_folders: excluded,
            include_files,
        }
    }

    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.exclude_folders.iter().any(|f| f == name.as_ref())
    }

    fn includes(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.to_lowercase())
            .is_some_and(|ext| self.include_files.iter().any(|i| *i == ext))
    }
}

impl Default for FsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for FsScanner {
    fn scan(&self, root: &Path) -> anyhow::Result<Vec<Project>> {
        let mut manifest_dirs: Vec<PathBuf> = Vec::new();
        let mut sources: Vec<PathBuf> = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
        {
            let entry = entry.context("directory walk failed")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if entry.file_name() == "package.json" {
                if let Some(dir) = path.parent() {
                    manifest_dirs.push(dir.to_path_buf());
                }
            } else if self.includes(path) {
                sources.push(path.to_path_buf());
            }
        }

        let mut projects: Vec<Project> = Vec::with_capacity(manifest_dirs.len());
        for dir in &manifest_dirs {
            let manifest_path = dir.join("package.json");
            let manifest = package_json::parse_file(&manifest_path)
                .with_context(|| format!("invalid manifest at {}", manifest_path.display()))?;
            projects.push(Project {
                manifest,
                files: Vec::new(),
                link: dir.display().to_string(),
            });
        }

        // Attach each source file to its nearest ancestor project.
        for file in sources {
            let owner = manifest_dirs
                .iter()
                .enumerate()
                .filter(|(_, dir)| file.starts_with(dir))
                .max_by_key(|(_, dir)| dir.as_os_str().len())
                .map(|(idx, _)| idx);

            if let Some(idx) = owner {
                projects[idx].files.push(file);
            }
        }

        Ok(projects)
    }
}
