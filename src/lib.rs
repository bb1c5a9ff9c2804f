//! usagescope - Import usage extractor for JavaScript/TypeScript projects
//!
//! This crate walks a codebase, detects where imported symbols are used
//! (type references and JSX elements, with their attributes), resolves the
//! version of the module each symbol came from, and returns normalized,
//! deterministically ordered usage records for adoption analytics.

pub mod item;
pub mod parser;
pub mod plugin;
pub mod resolver;
pub mod scan;
pub mod visitor;

pub use item::{AttrValue, Item, ItemArgs, ItemKind, ItemMetadata, Location};
pub use plugin::{Plugin, PluginFault, PluginRunner, ScanMetadata, ScanOutput};
pub use resolver::{FsManifestReader, ManifestReader, VersionResolver};
pub use scan::{scan, Analyzer, FsScanner, Project, ScanError, ScanOptions, Scanner};
pub use visitor::{EngineRegistry, ParseEngine, TypeScriptEngine, VisitError};
