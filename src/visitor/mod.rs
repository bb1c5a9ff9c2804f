//! Syntax visitor engines.
//!
//! A parse engine walks one source file's syntax tree and emits raw usage
//! events for imported symbols at their use sites. Engines are registered
//! in an [`EngineRegistry`] and selected per file; every engine receives
//! the same [`EngineHelpers`] so event construction and placeholder
//! formatting stay centralized instead of being duplicated per engine.

pub mod typescript;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::item::types::{AttrValue, ItemArgs, ItemKind, RawUsage};

pub use typescript::TypeScriptEngine;

/// Errors that can occur while visiting a source file.
///
/// Any of these is fatal for the scan: a file that cannot be parsed yields
/// no partial event stream.
#[derive(Error, Debug)]
pub enum VisitError {
    #[error("Tree-sitter language initialization failed")]
    LanguageInit,

    #[error("Parser produced no syntax tree")]
    NoTree,

    #[error("Source contains syntax errors")]
    Syntax,
}

/// Per-file binding of a local identifier to its originating import.
///
/// Built from a file's import declarations before use sites are visited;
/// dropped when the file's traversal ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Module specifier the symbol was imported from.
    pub module: String,
    /// Originating exported name; falls back to the local identifier when
    /// the import carries no explicit imported name (default and namespace
    /// imports).
    pub name: String,
}

/// Helpers handed to every engine implementation.
///
/// Keeps raw-event construction and fallback-token formatting in one place
/// so engines only deal in node kinds and byte offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineHelpers;

impl EngineHelpers {
    /// Builds a raw usage event.
    pub fn create_usage(
        &self,
        name: &str,
        module: &str,
        kind: ItemKind,
        offset: usize,
        args: Option<ItemArgs>,
    ) -> RawUsage {
        RawUsage {
            offset,
            module: module.to_string(),
            name: name.to_string(),
            kind,
            args,
        }
    }

    /// Builds the placeholder token for a syntax kind with no literal
    /// representation, e.g. `#identifier`.
    pub fn create_fallback_token(&self, kind: &str) -> AttrValue {
        AttrValue::Placeholder(format!("#{}", kind))
    }
}

/// A registered syntax engine.
///
/// `parse` walks the given source and pushes raw usage events through the
/// sink in source encounter order (pre-order traversal).
pub trait ParseEngine: Send + Sync {
    /// Identifier the engine is registered under.
    fn id(&self) -> &'static str;

    /// Whether this engine can parse the given file.
    fn handles(&self, path: &Path) -> bool;

    /// Parses `source` and emits raw usage events through `sink`.
    fn parse(
        &self,
        source: &str,
        path: &Path,
        helpers: &EngineHelpers,
        sink: &mut dyn FnMut(RawUsage),
    ) -> Result<(), VisitError>;
}

/// Ordered collection of parse engines, selected per file.
pub struct EngineRegistry {
    engines: Vec<Arc<dyn ParseEngine>>,
}

impl EngineRegistry {
    /// Creates a registry with the default engine set.
    pub fn new() -> Self {
        Self {
            engines: vec![Arc::new(TypeScriptEngine::new())],
        }
    }

    /// Creates a registry from caller-supplied engines, falling back to the
    /// default set when the list is empty.
    pub fn with_engines(engines: Vec<Arc<dyn ParseEngine>>) -> Self {
        if engines.is_empty() {
            Self::new()
        } else {
            Self { engines }
        }
    }

    /// Registers an additional engine; later registrations are consulted
    /// after earlier ones.
    pub fn register(&mut self, engine: Arc<dyn ParseEngine>) {
        self.engines.push(engine);
    }

    /// Looks up an engine by identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn ParseEngine>> {
        self.engines.iter().find(|e| e.id() == id)
    }

    /// Selects the first engine that handles the given file, if any.
    pub fn engine_for(&self, path: &Path) -> Option<&Arc<dyn ParseEngine>> {
        self.engines.iter().find(|e| e.handles(path))
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_token_format() {
        let helpers = EngineHelpers;
        assert_eq!(
            helpers.create_fallback_token("identifier"),
            AttrValue::Placeholder("#identifier".to_string())
        );
    }

    #[test]
    fn test_create_usage() {
        let helpers = EngineHelpers;
        let usage = helpers.create_usage("Button", "ui-kit", ItemKind::Element, 42, None);

        assert_eq!(usage.name, "Button");
        assert_eq!(usage.module, "ui-kit");
        assert_eq!(usage.kind, ItemKind::Element);
        assert_eq!(usage.offset, 42);
        assert!(usage.args.is_none());
    }

    #[test]
    fn test_registry_default_handles_typescript() {
        let registry = EngineRegistry::new();
        assert!(registry.engine_for(Path::new("a.tsx")).is_some());
        assert!(registry.engine_for(Path::new("a.rs")).is_none());
        assert!(registry.get("typescript").is_some());
    }

    #[test]
    fn test_registry_with_empty_engines_falls_back() {
        let registry = EngineRegistry::with_engines(Vec::new());
        assert!(registry.engine_for(Path::new("a.ts")).is_some());
    }
}
