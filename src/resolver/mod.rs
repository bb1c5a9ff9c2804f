//! Two-stage version resolution for module specifiers.
//!
//! Stage one resolves a specifier the way the JavaScript runtime would from
//! the importing file — ascending the directory tree probing `node_modules`
//! (or, for relative specifiers, reading the nearest enclosing manifest) —
//! and reports the installed manifest's version. Stage two, on a miss, falls
//! back to the range the project declares for the specifier. Resolution is
//! best-effort: both stages missing yields an empty string, never an error,
//! so a broken or absent installation cannot abort a scan.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::parser::package_json;
use crate::parser::types::PackageJson;

/// Reads package manifests for the authoritative resolution stage.
///
/// A trait so the filesystem can be faked in tests; each resolver stage is
/// testable without the other.
pub trait ManifestReader: Send + Sync {
    /// Reads the manifest at an exact path, if present and parseable.
    fn read(&self, manifest_path: &Path) -> Option<PackageJson>;

    /// Reads the nearest `package.json` at or above the given path.
    fn read_nearest(&self, path: &Path) -> Option<PackageJson> {
        for dir in ancestors_of(path) {
            let candidate = dir.join("package.json");
            if let Some(manifest) = self.read(&candidate) {
                return Some(manifest);
            }
        }
        None
    }
}

/// Filesystem-backed manifest reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsManifestReader;

impl ManifestReader for FsManifestReader {
    fn read(&self, manifest_path: &Path) -> Option<PackageJson> {
        if !manifest_path.is_file() {
            return None;
        }
        match package_json::parse_file(manifest_path) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                debug!(path = %manifest_path.display(), %err, "unreadable manifest skipped");
                None
            }
        }
    }
}

/// Resolves module specifiers to version strings.
pub struct VersionResolver {
    reader: Box<dyn ManifestReader>,
}

impl VersionResolver {
    /// Creates a resolver probing the real filesystem.
    pub fn new() -> Self {
        Self::with_reader(Box::new(FsManifestReader))
    }

    /// Creates a resolver over a custom manifest source.
    pub fn with_reader(reader: Box<dyn ManifestReader>) -> Self {
        Self { reader }
    }

    /// Resolves the version for `specifier` as imported from `from_file`.
    ///
    /// `declared` is the project's merged dependency map, keyed by the raw
    /// specifier. Returns an empty string when both stages miss.
    pub fn resolve(
        &self,
        specifier: &str,
        from_file: &Path,
        declared: &BTreeMap<String, String>,
    ) -> String {
        if let Some(version) = self.installed_version(specifier, from_file) {
            return version;
        }

        if let Some(range) = declared.get(specifier) {
            return range.clone();
        }

        debug!(specifier, from = %from_file.display(), "version unresolved");
        String::new()
    }

    /// Authoritative stage: the version of the installed module, located as
    /// the runtime would locate it from `from_file`. A manifest without a
    /// version field is a miss.
    pub fn installed_version(&self, specifier: &str, from_file: &Path) -> Option<String> {
        let manifest = if is_path_specifier(specifier) {
            let target = from_file.parent()?.join(specifier);
            self.reader.read_nearest(&normalize(&target))
        } else {
            let package = package_name(specifier)?;
            self.locate_installed(package, from_file)
        }?;

        manifest.version.filter(|v| !v.is_empty())
    }

    /// Ascends from the importing file's directory probing
    /// `node_modules/<package>/package.json`.
    fn locate_installed(&self, package: &str, from_file: &Path) -> Option<PackageJson> {
        for dir in ancestors_of(from_file) {
            let candidate = dir.join("node_modules").join(package).join("package.json");
            if let Some(manifest) = self.reader.read(&candidate) {
                return Some(manifest);
            }
        }
        None
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a specifier addresses a file rather than a package.
fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with('/')
}

/// Returns the package name for a bare specifier, collapsing subpaths.
/// Handles scoped packages like `@scope/package/subpath`.
pub fn package_name(specifier: &str) -> Option<&str> {
    if specifier.is_empty() || is_path_specifier(specifier) {
        return None;
    }

    if specifier.starts_with('@') {
        // @scope/package/subpath -> @scope/package
        let mut slashes = specifier.match_indices('/');
        return match (slashes.next(), slashes.next()) {
            (Some(_), Some((end, _))) => Some(&specifier[..end]),
            (Some(_), None) => Some(specifier),
            // A bare scope is not a package.
            (None, _) => None,
        };
    }

    match specifier.find('/') {
        Some(idx) => Some(&specifier[..idx]),
        None => Some(specifier),
    }
}

/// Ancestor directories of a path, innermost first, including the path's
/// own directory when it is one.
fn ancestors_of(path: &Path) -> impl Iterator<Item = &Path> {
    let start = if path.extension().is_some() || path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    };
    start.ancestors()
}

/// Lexically resolves `.` and `..` components without touching the
/// filesystem, so probe paths stay stable for fake readers.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    /// Fake reader over an in-memory path → manifest table.
    #[derive(Default)]
    struct FakeReader {
        manifests: HashMap<PathBuf, PackageJson>,
    }

    impl FakeReader {
        fn with(mut self, path: &str, version: &str) -> Self {
            self.manifests.insert(
                PathBuf::from(path),
                PackageJson {
                    version: Some(version.to_string()),
                    ..Default::default()
                },
            );
            self
        }
    }

    impl ManifestReader for FakeReader {
        fn read(&self, manifest_path: &Path) -> Option<PackageJson> {
            self.manifests.get(manifest_path).cloned()
        }
    }

    fn declared(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("react"), Some("react"));
        assert_eq!(package_name("lodash/debounce"), Some("lodash"));
        assert_eq!(
            package_name("@tanstack/react-query"),
            Some("@tanstack/react-query")
        );
        assert_eq!(
            package_name("@tanstack/react-query/devtools"),
            Some("@tanstack/react-query")
        );
        assert_eq!(package_name("./utils"), None);
        assert_eq!(package_name("@loneScope"), None);
        assert_eq!(package_name(""), None);
    }

    #[test]
    fn test_installed_version_nearest_node_modules() {
        let reader = FakeReader::default()
            .with("/repo/app/node_modules/ui-kit/package.json", "3.1.4");
        let resolver = VersionResolver::with_reader(Box::new(reader));

        let version = resolver.resolve(
            "ui-kit",
            Path::new("/repo/app/src/pages/index.tsx"),
            &BTreeMap::new(),
        );
        assert_eq!(version, "3.1.4");
    }

    #[test]
    fn test_installed_version_ascends_past_inner_dirs() {
        let reader =
            FakeReader::default().with("/repo/node_modules/ui-kit/package.json", "2.0.0");
        let resolver = VersionResolver::with_reader(Box::new(reader));

        let version = resolver.resolve(
            "ui-kit",
            Path::new("/repo/app/src/index.tsx"),
            &BTreeMap::new(),
        );
        assert_eq!(version, "2.0.0");
    }

    #[test]
    fn test_subpath_specifier_collapses_to_package_root() {
        let reader =
            FakeReader::default().with("/repo/node_modules/lodash/package.json", "4.17.21");
        let resolver = VersionResolver::with_reader(Box::new(reader));

        let version = resolver.resolve(
            "lodash/debounce",
            Path::new("/repo/src/index.ts"),
            &BTreeMap::new(),
        );
        assert_eq!(version, "4.17.21");
    }

    #[test]
    fn test_relative_specifier_reads_enclosing_manifest() {
        let reader = FakeReader::default().with("/repo/package.json", "0.9.0");
        let resolver = VersionResolver::with_reader(Box::new(reader));

        let version = resolver.resolve(
            "./components/button",
            Path::new("/repo/src/index.tsx"),
            &BTreeMap::new(),
        );
        assert_eq!(version, "0.9.0");
    }

    #[test]
    fn test_declared_fallback_returns_range_verbatim() {
        let resolver = VersionResolver::with_reader(Box::new(FakeReader::default()));

        let version = resolver.resolve(
            "mod",
            Path::new("/repo/src/index.ts"),
            &declared(&[("mod", "^2.0.0")]),
        );
        assert_eq!(version, "^2.0.0");
    }

    #[test]
    fn test_fallback_uses_raw_specifier_key() {
        // Subpath specifiers are not collapsed for the declared lookup.
        let resolver = VersionResolver::with_reader(Box::new(FakeReader::default()));

        let version = resolver.resolve(
            "lodash/debounce",
            Path::new("/repo/src/index.ts"),
            &declared(&[("lodash", "^4.0.0")]),
        );
        assert_eq!(version, "");
    }

    #[test]
    fn test_authoritative_wins_over_declared() {
        let reader =
            FakeReader::default().with("/repo/node_modules/mod/package.json", "2.3.4");
        let resolver = VersionResolver::with_reader(Box::new(reader));

        let version = resolver.resolve(
            "mod",
            Path::new("/repo/src/index.ts"),
            &declared(&[("mod", "^2.0.0")]),
        );
        assert_eq!(version, "2.3.4");
    }

    #[test]
    fn test_manifest_without_version_is_a_miss() {
        let mut reader = FakeReader::default();
        reader.manifests.insert(
            PathBuf::from("/repo/node_modules/mod/package.json"),
            PackageJson::default(),
        );
        let resolver = VersionResolver::with_reader(Box::new(reader));

        let version = resolver.resolve(
            "mod",
            Path::new("/repo/src/index.ts"),
            &declared(&[("mod", "^1.0.0")]),
        );
        assert_eq!(version, "^1.0.0");
    }

    #[test]
    fn test_both_stages_missing_yields_empty() {
        let resolver = VersionResolver::with_reader(Box::new(FakeReader::default()));

        let version = resolver.resolve(
            "ghost-module",
            Path::new("/repo/src/index.ts"),
            &BTreeMap::new(),
        );
        assert_eq!(version, "");
    }

    #[test]
    fn test_filesystem_reader_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let pkg_dir = root.join("node_modules/ui-kit");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(
            pkg_dir.join("package.json"),
            r#"{"name": "ui-kit", "version": "5.6.7"}"#,
        )
        .unwrap();
        let src = root.join("src");
        fs::create_dir_all(&src).unwrap();
        let from = src.join("app.tsx");
        fs::write(&from, "").unwrap();

        let resolver = VersionResolver::new();
        assert_eq!(resolver.resolve("ui-kit", &from, &BTreeMap::new()), "5.6.7");
    }
}
