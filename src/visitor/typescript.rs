//! Tree-sitter engine for the JavaScript/TypeScript family.
//!
//! Extraction runs in two explicit passes over the parsed tree: pass 1
//! collects import bindings, pass 2 visits use sites and emits events for
//! identifiers that resolve in the binding table. Binding resolution never
//! depends on where import declarations sit relative to their use sites.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use super::{EngineHelpers, ImportBinding, ParseEngine, VisitError};
use crate::item::types::{AttrValue, ItemArgs, ItemKind, RawUsage};

/// Language variant for file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceLanguage {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "jsx" => Some(SourceLanguage::Jsx),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Get tree-sitter grammar for this language variant.
    fn grammar(&self) -> Language {
        match self {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => {
                tree_sitter_javascript::LANGUAGE.into()
            }
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Engine for JavaScript, JSX, TypeScript, and TSX sources.
///
/// Emits `type` events for imported identifiers in type positions
/// (including indexed access like `Imported["key"]`) and `element` events
/// for JSX elements whose tag resolves to an import, with their attributes
/// collected into args.
pub struct TypeScriptEngine;

impl TypeScriptEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypeScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseEngine for TypeScriptEngine {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SourceLanguage::from_extension)
            .is_some()
    }

    fn parse(
        &self,
        source: &str,
        path: &Path,
        helpers: &EngineHelpers,
        sink: &mut dyn FnMut(RawUsage),
    ) -> Result<(), VisitError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = SourceLanguage::from_extension(ext).unwrap_or(SourceLanguage::Tsx);

        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|_| VisitError::LanguageInit)?;

        let tree = parser.parse(source, None).ok_or(VisitError::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(VisitError::Syntax);
        }

        // Pass 1: import bindings.
        let mut bindings = HashMap::new();
        walk(root, &mut |node| {
            if node.kind() == "import_statement" {
                collect_import(node, source, &mut bindings);
            }
        });

        // Pass 2: use sites, in source encounter order.
        walk(root, &mut |node| match node.kind() {
            "type_identifier" => {
                emit_type_reference(node, source, &bindings, helpers, sink);
            }
            "jsx_opening_element" | "jsx_self_closing_element" => {
                emit_element(node, source, &bindings, helpers, sink);
            }
            _ => {}
        });

        Ok(())
    }
}

/// Pre-order traversal applying `f` to every node.
fn walk(node: Node, f: &mut impl FnMut(Node)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

/// Records the bindings introduced by one import statement.
fn collect_import(node: Node, source: &str, bindings: &mut HashMap<String, ImportBinding>) {
    let mut module = None;
    let mut locals: Vec<(String, String)> = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string" => {
                module = extract_string_value(child, source);
            }
            "import_clause" => {
                collect_import_clause(child, source, &mut locals);
            }
            _ => {}
        }
    }

    let Some(module) = module else {
        return;
    };

    for (local, name) in locals {
        bindings.insert(
            local,
            ImportBinding {
                module: module.clone(),
                name,
            },
        );
    }
}

/// Collects (local, imported-name) pairs from an import clause.
fn collect_import_clause(node: Node, source: &str, locals: &mut Vec<(String, String)>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                // Default import: no explicit imported name, so the local
                // identifier doubles as the name.
                if let Some(name) = node_text(child, source) {
                    locals.push((name.to_string(), name.to_string()));
                }
            }
            "namespace_import" => {
                if let Some(name) = find_identifier(child, source) {
                    locals.push((name.clone(), name));
                }
            }
            "named_imports" => {
                let mut spec_cursor = child.walk();
                for spec in child.named_children(&mut spec_cursor) {
                    if spec.kind() == "import_specifier" {
                        if let Some((imported, local)) = parse_import_specifier(spec, source) {
                            locals.push((local, imported));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parses a single import specifier: `foo` or `foo as bar`.
/// Returns `(imported, local)`.
fn parse_import_specifier(node: Node, source: &str) -> Option<(String, String)> {
    let mut imported = None;
    let mut local = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            let name = node_text(child, source)?;
            if imported.is_none() {
                imported = Some(name.to_string());
            } else {
                local = Some(name.to_string());
            }
        }
    }

    let imported = imported?;
    let local = local.unwrap_or_else(|| imported.clone());

    Some((imported, local))
}

/// Find the first identifier child (local name of a namespace import).
fn find_identifier(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return node_text(child, source).map(|s| s.to_string());
        }
    }
    None
}

/// Emits a `type` event for a bound identifier in type position.
///
/// Covers plain references and indexed access: in `Imported["key"]` the
/// object identifier starts at the same offset as the whole lookup, so one
/// event at the identifier covers both shapes.
fn emit_type_reference(
    node: Node,
    source: &str,
    bindings: &HashMap<String, ImportBinding>,
    helpers: &EngineHelpers,
    sink: &mut dyn FnMut(RawUsage),
) {
    if is_declaration_name(node) {
        return;
    }

    let Some(text) = node_text(node, source) else {
        return;
    };
    let Some(binding) = bindings.get(text) else {
        return;
    };

    sink(helpers.create_usage(
        &binding.name,
        &binding.module,
        ItemKind::Type,
        node.start_byte(),
        None,
    ));
}

/// Whether a type identifier is the declared name of its parent rather
/// than a reference.
fn is_declaration_name(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };

    match parent.kind() {
        "type_alias_declaration"
        | "interface_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "enum_declaration" => parent
            .child_by_field_name("name")
            .is_some_and(|name| name.id() == node.id()),
        "type_parameter" => true,
        _ => false,
    }
}

/// Emits an `element` event for a JSX element whose tag resolves in the
/// binding table, collecting its attributes.
fn emit_element(
    node: Node,
    source: &str,
    bindings: &HashMap<String, ImportBinding>,
    helpers: &EngineHelpers,
    sink: &mut dyn FnMut(RawUsage),
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    // Member and namespaced tags (`<Foo.Bar/>`) are not direct bindings.
    if name_node.kind() != "identifier" {
        return;
    }
    let Some(tag) = node_text(name_node, source) else {
        return;
    };
    let Some(binding) = bindings.get(tag) else {
        return;
    };

    let mut data = BTreeMap::new();
    let mut is_spread = false;

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "jsx_attribute" => {
                if let Some((key, value)) = extract_attribute(child, source, helpers) {
                    data.insert(key, value);
                }
            }
            // A spread of props appears as an expression child of the
            // opening element: `<X {...props}/>`.
            "jsx_expression" => {
                if contains_spread(child) {
                    is_spread = true;
                }
            }
            _ => {}
        }
    }

    sink(helpers.create_usage(
        &binding.name,
        &binding.module,
        ItemKind::Element,
        node.start_byte(),
        Some(ItemArgs { data, is_spread }),
    ));
}

/// Extracts one `name=value` attribute pair; `None` for attribute shapes
/// without a plain-identifier name.
fn extract_attribute(
    node: Node,
    source: &str,
    helpers: &EngineHelpers,
) -> Option<(String, AttrValue)> {
    let name_node = node.named_child(0)?;
    if name_node.kind() != "property_identifier" {
        return None;
    }
    let key = node_text(name_node, source)?.to_string();
    let value = literal_value(node.named_child(1), source, helpers);

    Some((key, value))
}

/// Resolves an attribute value node to a primitive, unwrapping expression
/// containers recursively; shapes without a literal representation yield a
/// placeholder token. A missing value means a bare attribute: `true`.
fn literal_value(node: Option<Node>, source: &str, helpers: &EngineHelpers) -> AttrValue {
    let Some(node) = node else {
        return AttrValue::Bool(true);
    };

    match node.kind() {
        "string" => AttrValue::Str(
            extract_string_value(node, source).unwrap_or_default(),
        ),
        "number" => {
            let text = node_text(node, source).unwrap_or_default();
            if let Some(digits) = text.strip_suffix('n') {
                AttrValue::BigInt(digits.to_string())
            } else if let Ok(value) = text.parse::<f64>() {
                AttrValue::Number(value)
            } else {
                helpers.create_fallback_token(node.kind())
            }
        }
        "true" => AttrValue::Bool(true),
        "false" => AttrValue::Bool(false),
        "null" => AttrValue::Null,
        "jsx_expression" => literal_value(node.named_child(0), source, helpers),
        other => helpers.create_fallback_token(other),
    }
}

/// Whether a JSX expression container holds a props spread.
fn contains_spread(node: Node) -> bool {
    let mut cursor = node.walk();
    let has_spread = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "spread_element");
    has_spread
}

/// Extract the text content of a node.
fn node_text<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Extract string value (removes quotes).
fn extract_string_value(node: Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    let trimmed = text
        .trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`']);
    Some(trimmed.to_string())
}
