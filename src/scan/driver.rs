//! Aggregation driver.
//!
//! Wires discovery, the visitor engines, the version resolver, the item
//! factory, and the plugin runner into one pipeline. Output ordering is a
//! correctness invariant: project discovery order × file discovery order ×
//! in-file encounter order. File reading and parsing fan out across a
//! rayon pool; ordering is preserved by collecting per-file event buffers
//! in file order, never by execution order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use super::scanner::{FsScanner, Project, Scanner};
use crate::item::factory::create_item;
use crate::item::types::{Item, RawUsage};
use crate::plugin::{Plugin, PluginRunner, ScanMetadata, ScanOutput};
use crate::resolver::VersionResolver;
use crate::visitor::{EngineHelpers, EngineRegistry, ParseEngine, VisitError};

/// Fatal scan failures. Resolution misses and plugin faults are recovered
/// locally and never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to discover projects: {0}")]
    Discovery(anyhow::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: VisitError,
    },
}

/// Configuration surface accepted by a scan.
#[derive(Default)]
pub struct ScanOptions {
    /// Non-empty list restricts output to items imported from these
    /// modules; matching happens before version resolution.
    pub include_modules: Vec<String>,
    /// Folder names the scanner must not descend into, on top of the
    /// built-in exclusions. Forwarded to the scanner untouched.
    pub exclude_folders: Vec<String>,
    /// Extension allow-list forwarded to the scanner untouched; empty
    /// means the default source set.
    pub include_files: Vec<String>,
    /// Observers registered for this scan, invoked in order.
    pub plugins: Vec<Box<dyn Plugin>>,
    /// Parse engines registered for this scan; empty means the default
    /// engine set.
    pub engines: Vec<Arc<dyn ParseEngine>>,
}

/// The extraction pipeline over already-discovered projects.
///
/// [`scan`] is the convenience entry point over [`FsScanner`]; callers
/// with their own discovery drive this directly.
pub struct Analyzer {
    registry: EngineRegistry,
    resolver: VersionResolver,
    include_modules: Vec<String>,
}

impl Analyzer {
    pub fn new(
        registry: EngineRegistry,
        resolver: VersionResolver,
        include_modules: Vec<String>,
    ) -> Self {
        Self {
            registry,
            resolver,
            include_modules,
        }
    }

    /// Runs extraction over the given projects, in order, notifying the
    /// plugin runner per surviving item.
    pub fn analyze(
        &self,
        root: &Path,
        projects: &[Project],
        plugins: &mut PluginRunner,
    ) -> Result<Vec<Item>, ScanError> {
        let helpers = EngineHelpers;
        let mut items: Vec<Item> = Vec::new();

        for project in projects {
            let declared = project.manifest.merged_dependencies();
            let project_name = project.name().to_string();
            debug!(
                project = %project_name,
                files = project.files.len(),
                "analyzing project"
            );

            // Read + parse fan out; per-file buffers come back in file
            // order and the first failure aborts the project.
            let parsed = project
                .files
                .par_iter()
                .map(|file| self.parse_file(file, &helpers))
                .collect::<Result<Vec<_>, ScanError>>()?;

            for (file, code, events) in parsed.into_iter().flatten() {
                for event in events {
                    if !self.include_modules.is_empty()
                        && !self.include_modules.contains(&event.module)
                    {
                        continue;
                    }

                    let version = self.resolver.resolve(&event.module, file, &declared);
                    let mut item = create_item(event, &code, file, root, &project_name);
                    item.version = version;

                    plugins.collect(&item);
                    items.push(item);
                }
            }
        }

        Ok(items)
    }

    /// Reads and parses one file; `None` when no registered engine
    /// handles it.
    fn parse_file<'a>(
        &self,
        file: &'a PathBuf,
        helpers: &EngineHelpers,
    ) -> Result<Option<(&'a PathBuf, String, Vec<RawUsage>)>, ScanError> {
        let Some(engine) = self.registry.engine_for(file) else {
            return Ok(None);
        };

        let code = fs::read_to_string(file).map_err(|source| ScanError::FileRead {
            path: file.clone(),
            source,
        })?;

        let mut events = Vec::new();
        engine
            .parse(&code, file, helpers, &mut |event| events.push(event))
            .map_err(|source| ScanError::Parse {
                path: file.clone(),
                source,
            })?;

        Ok(Some((file, code, events)))
    }
}

/// Scans a directory tree and returns the complete, ordered item list.
///
/// All-or-nothing: either the full output, or the first fatal error
/// encountered.
pub fn scan(root: &Path, options: ScanOptions) -> Result<ScanOutput, ScanError> {
    let ScanOptions {
        include_modules,
        exclude_folders,
        include_files,
        plugins,
        engines,
    } = options;

    let scanner = FsScanner::with_options(exclude_folders, include_files);
    let projects = scanner.scan(root).map_err(ScanError::Discovery)?;
    info!(
        root = %root.display(),
        projects = projects.len(),
        "scan started"
    );

    let metadata = ScanMetadata {
        created_at: Utc::now().to_rfc3339(),
        source: root.display().to_string(),
    };

    let mut runner = PluginRunner::new(plugins);
    runner.start(&metadata);

    let analyzer = Analyzer::new(
        EngineRegistry::with_engines(engines),
        VersionResolver::new(),
        include_modules,
    );
    let data = analyzer.analyze(root, &projects, &mut runner)?;
    info!(items = data.len(), "scan finished");

    let output = ScanOutput { metadata, data };
    runner.end(&output);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::types::ItemKind;
    use anyhow::anyhow;
    use std::sync::Mutex;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture_project(root: &Path) {
        write(
            root,
            "package.json",
            r#"{
                "name": "demo",
                "version": "0.1.0",
                "dependencies": {"ui-kit": "^2.0.0", "other-kit": "~1.1.0"}
            }"#,
        );
        write(
            root,
            "src/app.tsx",
            r#"import { Button } from "ui-kit";
import { Card } from "other-kit";
const a = <Button kind="primary" />;
const b = <Card />;
"#,
        );
    }

    #[test]
    fn test_scan_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixture_project(root);

        let output = scan(root, ScanOptions::default()).unwrap();

        assert_eq!(output.metadata.source, root.display().to_string());
        assert_eq!(output.data.len(), 2);

        let button = &output.data[0];
        assert_eq!(button.name, "Button");
        assert_eq!(button.module, "ui-kit");
        assert_eq!(button.kind, ItemKind::Element);
        // No installation on disk, so the declared range comes through.
        assert_eq!(button.version, "^2.0.0");
        assert_eq!(button.location.file, "src/app.tsx");
        assert_eq!(button.location.module, "demo");
        assert_eq!(button.location.line, 3);

        assert_eq!(output.data[1].module, "other-kit");
        assert_eq!(output.data[1].version, "~1.1.0");
    }

    #[test]
    fn test_installed_version_wins_over_declared() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixture_project(root);
        write(
            root,
            "node_modules/ui-kit/package.json",
            r#"{"name": "ui-kit", "version": "2.3.4"}"#,
        );

        let output = scan(root, ScanOptions::default()).unwrap();
        assert_eq!(output.data[0].version, "2.3.4");
    }

    #[test]
    fn test_include_modules_filter() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixture_project(root);

        let output = scan(
            root,
            ScanOptions {
                include_modules: vec!["ui-kit".to_string()],
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(output.data.len(), 1);
        assert!(output.data.iter().all(|i| i.module == "ui-kit"));
    }

    #[test]
    fn test_output_order_is_project_file_encounter() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "package.json", r#"{"name": "demo"}"#);
        write(
            root,
            "src/a.tsx",
            "import { X } from \"mod\";\nconst a = <X />;\nconst b = <X />;\n",
        );
        write(
            root,
            "src/b.tsx",
            "import { Y } from \"mod\";\nconst c = <Y />;\n",
        );

        let output = scan(root, ScanOptions::default()).unwrap();

        let names: Vec<_> = output.data.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["X", "X", "Y"]);
        assert!(output.data[0].location.line < output.data[1].location.line);
    }

    #[test]
    fn test_scan_is_idempotent_modulo_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixture_project(root);

        let mut first = scan(root, ScanOptions::default()).unwrap().data;
        let mut second = scan(root, ScanOptions::default()).unwrap().data;
        for item in first.iter_mut().chain(second.iter_mut()) {
            item.created_at.clear();
        }

        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_error_aborts_scan() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixture_project(root);
        write(root, "src/broken.ts", "import {");

        let result = scan(root, ScanOptions::default());
        assert!(matches!(result, Err(ScanError::Parse { .. })));
    }

    #[test]
    fn test_unhandled_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixture_project(root);
        write(root, "src/styles.css", ".a { color: red }");

        let output = scan(
            root,
            ScanOptions {
                include_files: vec!["tsx".to_string(), "css".to_string()],
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(output.data.len(), 2);
    }

    /// Fails on the second collected item, records everything it saw.
    struct FlakyCounter {
        seen: Arc<Mutex<Vec<String>>>,
        calls: usize,
    }

    impl Plugin for FlakyCounter {
        fn name(&self) -> &str {
            "flaky-counter"
        }

        fn on_collect(&mut self, item: &Item) -> anyhow::Result<()> {
            self.calls += 1;
            if self.calls == 2 {
                return Err(anyhow!("boom"));
            }
            self.seen.lock().unwrap().push(item.name.clone());
            Ok(())
        }
    }

    #[test]
    fn test_plugin_fault_does_not_drop_items() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "package.json", r#"{"name": "demo"}"#);
        write(
            root,
            "src/a.tsx",
            "import { X } from \"mod\";\nconst a = <X />;\nconst b = <X />;\nconst c = <X />;\n",
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let output = scan(
            root,
            ScanOptions {
                plugins: vec![Box::new(FlakyCounter {
                    seen: Arc::clone(&seen),
                    calls: 0,
                })],
                ..Default::default()
            },
        )
        .unwrap();

        // Item 2's hook failure affects neither the output nor item 3.
        assert_eq!(output.data.len(), 3);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_project_without_source_files_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "package.json", r#"{"name": "empty"}"#);

        let output = scan(root, ScanOptions::default()).unwrap();
        assert!(output.data.is_empty());
    }
}
