//! Core data model for detected usages.
//!
//! An [`Item`] is the normalized record of one detected usage of an imported
//! symbol: which symbol, from which module, at which version, where in the
//! scanned tree. Raw events produced by a parse engine are [`RawUsage`]
//! values; the factory in [`crate::item::factory`] finalizes them.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The syntactic category of a detected usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A JSX/template element usage: `<Button … />`.
    Element,
    /// A type-position reference: `let x: Imported` or `Imported["key"]`.
    Type,
    /// A call of an imported function.
    Method,
    /// A value-position reference.
    Variable,
    /// Anything an engine detects but cannot categorize.
    Unknown,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemKind::Element => "element",
            ItemKind::Type => "type",
            ItemKind::Method => "method",
            ItemKind::Variable => "variable",
            ItemKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A primitive attribute/argument value, or a placeholder for syntax that
/// has no literal representation.
///
/// Placeholder tokens are `#` followed by the unsupported node kind, e.g.
/// `#identifier` for `prop={someVariable}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    /// Bigint literals keep their digit text; they may not fit in f64.
    BigInt(String),
    Str(String),
    Placeholder(String),
}

impl AttrValue {
    /// Returns true if this value is a `#<kind>` placeholder token.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, AttrValue::Placeholder(_))
    }
}

/// Collected element attributes or call arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemArgs {
    /// Attribute name → extracted value.
    pub data: BTreeMap<String, AttrValue>,
    /// Whether the usage spreads additional props (`{...props}`).
    pub is_spread: bool,
}

/// Where a usage was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    /// Path relative to the scan root, `/`-separated on every platform.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 0-based column, in bytes from the last newline.
    pub column: usize,
    /// Name of the enclosing project.
    pub module: String,
}

/// Extra flags attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub has_spread_operator: bool,
}

/// Normalized record of one detected usage of an imported symbol.
///
/// `module` and `name` are always non-empty; `version` may be empty when
/// resolution missed, but the field is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Originating exported/imported symbol name.
    pub name: String,
    /// Module specifier the symbol was imported from.
    pub module: String,
    /// Resolved version or declared range; empty when unresolved.
    pub version: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<ItemArgs>,
    pub location: Location,
    pub metadata: ItemMetadata,
    /// RFC 3339 timestamp of item construction.
    pub created_at: String,
}

/// A raw usage event as emitted by a parse engine, before location math,
/// version resolution, and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUsage {
    /// Byte offset of the usage site in the source text.
    pub offset: usize,
    /// Module specifier the used symbol was imported from.
    pub module: String,
    /// Originating exported name of the used symbol.
    pub name: String,
    pub kind: ItemKind,
    pub args: Option<ItemArgs>,
}
