//! Per-file facts extracted from the syntax tree.
//!
//! Facts are what the project index is built from: which names a file
//! imports (and from where), which names it exports (and what they stand
//! for), and where each identifier occurs outside import/export clauses.

use std::collections::HashMap;

use tree_sitter::{Node, TreeCursor};

use super::syntax::{child_of_kind, node_text, string_value, SourceModule};
use super::Span;
pub use crate::graph::EdgeKind;

/// What an import binding refers to in the imported module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imported {
    /// `import { name } from 'm'` or `import { name as local } from 'm'`
    Named(String),
    /// `import local from 'm'`
    Default,
    /// `import * as local from 'm'`
    Namespace,
}

/// A single local name introduced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Name bound in the importing file.
    pub local: String,
    /// What is imported.
    pub imported: Imported,
    /// The module specifier as written.
    pub module: String,
    /// Span of the imported name (the local name for default/namespace imports).
    pub span: Span,
}

/// What an exported name stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOrigin {
    /// A name bound in this file (declaration or import).
    Local(String),
    /// An anonymous `export default <expr>`.
    Default,
    /// `export { imported as exported } from 'module'`
    Reexport { module: String, imported: String },
    /// `export * as exported from 'module'`
    Namespace { module: String },
}

/// One exported name of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBinding {
    /// Name visible to importers (`default` for default exports).
    pub exported: String,
    pub origin: ExportOrigin,
    /// Identifying span: the declared identifier, the specifier's name, or the
    /// `default` keyword of an anonymous default export.
    pub span: Span,
    /// Whether the binding comes from an `export { ... }` clause.
    pub in_clause: bool,
}

/// A `ns.name` access (value or type position).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub object: String,
    pub property: String,
    /// Span of the property name.
    pub span: Span,
}

/// Everything the project index needs to know about one file.
#[derive(Debug, Clone, Default)]
pub struct ModuleFacts {
    pub imports: Vec<ImportBinding>,
    /// Modules imported only for side effects.
    pub side_effect_imports: Vec<String>,
    pub exports: Vec<ExportBinding>,
    /// `export * from 'module'` specifiers.
    pub wildcards: Vec<String>,
    /// Identifier occurrences by name, in document order.
    pub occurrences: HashMap<String, Vec<Span>>,
    pub members: Vec<MemberAccess>,
    /// `import('m')` and `require('m')` calls with a literal specifier.
    pub dynamic_imports: Vec<(String, Span)>,
}

impl ModuleFacts {
    /// Extract facts from a parsed module.
    pub fn extract(module: &SourceModule) -> Self {
        let mut facts = Self::default();
        let mut cursor = module.root().walk();
        facts.visit_node(&mut cursor, module.text());
        facts
    }

    /// Spans where `name` occurs outside import statements and export clauses.
    pub fn occurrences_of(&self, name: &str) -> &[Span] {
        self.occurrences.get(name).map_or(&[], Vec::as_slice)
    }

    /// The import binding introducing `local`, if any.
    pub fn import_for_local(&self, local: &str) -> Option<&ImportBinding> {
        self.imports.iter().find(|import| import.local == local)
    }

    /// Returns true if the file exports a binding named `exported`.
    pub fn exports_name(&self, exported: &str) -> bool {
        self.exports.iter().any(|export| export.exported == exported)
    }

    /// Every module specifier this file depends on, with the edge kind.
    pub fn dependencies(&self) -> Vec<(&str, EdgeKind)> {
        let mut deps: Vec<(&str, EdgeKind)> = self
            .imports
            .iter()
            .map(|import| (import.module.as_str(), EdgeKind::Import))
            .collect();
        deps.extend(
            self.side_effect_imports
                .iter()
                .map(|module| (module.as_str(), EdgeKind::Import)),
        );
        for export in &self.exports {
            match &export.origin {
                ExportOrigin::Reexport { module, .. } | ExportOrigin::Namespace { module } => {
                    deps.push((module.as_str(), EdgeKind::Reexport));
                }
                ExportOrigin::Local(_) | ExportOrigin::Default => {}
            }
        }
        deps.extend(
            self.dynamic_imports
                .iter()
                .map(|(module, _)| (module.as_str(), EdgeKind::Import)),
        );
        deps.extend(
            self.wildcards
                .iter()
                .map(|module| (module.as_str(), EdgeKind::Wildcard)),
        );
        deps
    }

    /// Name of the identifier occurrence covering `offset`, if any.
    pub fn name_at(&self, offset: usize) -> Option<&str> {
        self.occurrences
            .iter()
            .find(|(_, spans)| spans.iter().any(|span| span.contains(offset)))
            .map(|(name, _)| name.as_str())
    }

    /// Recursively visit nodes, recording occurrences and bindings.
    fn visit_node(&mut self, cursor: &mut TreeCursor, source: &str) {
        let node = cursor.node();

        match node.kind() {
            "import_statement" => {
                self.parse_import(&node, source);
                return;
            }
            "export_clause" | "namespace_export" | "string" | "comment" => return,
            "export_statement" => self.parse_export(&node, source),
            "identifier"
            | "type_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern" => {
                self.occurrences
                    .entry(node_text(&node, source).to_string())
                    .or_default()
                    .push(Span::of(&node));
            }
            "member_expression" => self.record_member(&node, "object", "property", source),
            "nested_type_identifier" => self.record_member(&node, "module", "name", source),
            "call_expression" => self.record_dynamic_import(&node, source),
            _ => {}
        }

        if cursor.goto_first_child() {
            loop {
                self.visit_node(cursor, source);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    fn record_member(&mut self, node: &Node, object: &str, property: &str, source: &str) {
        let (Some(object), Some(property)) = (
            node.child_by_field_name(object),
            node.child_by_field_name(property),
        ) else {
            return;
        };
        if object.kind() != "identifier" {
            return;
        }
        self.members.push(MemberAccess {
            object: node_text(&object, source).to_string(),
            property: node_text(&property, source).to_string(),
            span: Span::of(&property),
        });
    }

    fn record_dynamic_import(&mut self, node: &Node, source: &str) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let dynamic = function.kind() == "import"
            || (function.kind() == "identifier" && node_text(&function, source) == "require");
        if !dynamic {
            return;
        }
        let Some(arguments) = node.child_by_field_name("arguments") else {
            return;
        };
        if let Some(specifier) = child_of_kind(&arguments, "string") {
            self.dynamic_imports
                .push((string_value(&specifier, source), Span::of(node)));
        }
    }

    /// Parse an ES6 import statement.
    fn parse_import(&mut self, node: &Node, source: &str) {
        let Some(module) = node
            .child_by_field_name("source")
            .map(|s| string_value(&s, source))
        else {
            return;
        };

        let Some(clause) = child_of_kind(node, "import_clause") else {
            self.side_effect_imports.push(module);
            return;
        };

        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => self.imports.push(ImportBinding {
                    local: node_text(&child, source).to_string(),
                    imported: Imported::Default,
                    module: module.clone(),
                    span: Span::of(&child),
                }),
                "namespace_import" => {
                    if let Some(name) = child_of_kind(&child, "identifier") {
                        self.imports.push(ImportBinding {
                            local: node_text(&name, source).to_string(),
                            imported: Imported::Namespace,
                            module: module.clone(),
                            span: Span::of(&name),
                        });
                    }
                }
                "named_imports" => {
                    let mut specifiers = child.walk();
                    for specifier in child.named_children(&mut specifiers) {
                        if specifier.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = specifier.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = module_export_name(&name, source);
                        let local = specifier
                            .child_by_field_name("alias")
                            .map(|alias| node_text(&alias, source).to_string())
                            .unwrap_or_else(|| imported.clone());
                        let imported = if imported == "default" {
                            Imported::Default
                        } else {
                            Imported::Named(imported)
                        };
                        self.imports.push(ImportBinding {
                            local,
                            imported,
                            module: module.clone(),
                            span: Span::of(&name),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    /// Record the export bindings an export statement introduces.
    fn parse_export(&mut self, node: &Node, source: &str) {
        let module = node
            .child_by_field_name("source")
            .map(|s| string_value(&s, source));

        if let Some(clause) = child_of_kind(node, "export_clause") {
            for (_, name, alias) in clause_specifiers(&clause) {
                let local = module_export_name(&name, source);
                let exported = alias
                    .map(|alias| module_export_name(&alias, source))
                    .unwrap_or_else(|| local.clone());
                let origin = match &module {
                    Some(module) => ExportOrigin::Reexport {
                        module: module.clone(),
                        imported: local,
                    },
                    None => ExportOrigin::Local(local),
                };
                self.exports.push(ExportBinding {
                    exported,
                    origin,
                    span: Span::of(&name),
                    in_clause: true,
                });
            }
            return;
        }

        if let Some(namespace) = child_of_kind(node, "namespace_export") {
            let mut cursor = namespace.walk();
            let name = namespace.named_children(&mut cursor).last();
            if let (Some(name), Some(module)) = (name, module) {
                self.exports.push(ExportBinding {
                    exported: module_export_name(&name, source),
                    origin: ExportOrigin::Namespace { module },
                    span: Span::of(&name),
                    in_clause: false,
                });
            }
            return;
        }

        if child_of_kind(node, "*").is_some() {
            if let Some(module) = module {
                self.wildcards.push(module);
            }
            return;
        }

        let default = child_of_kind(node, "default");
        let target = node
            .child_by_field_name("declaration")
            .or_else(|| node.child_by_field_name("value"));

        match (default, target) {
            (Some(default), Some(target)) => {
                let named = match target.kind() {
                    "function_declaration"
                    | "generator_function_declaration"
                    | "class_declaration"
                    | "abstract_class_declaration"
                    | "function_expression"
                    | "function"
                    | "generator_function"
                    | "class" => target.child_by_field_name("name"),
                    _ => None,
                };
                let binding = match named {
                    Some(name) => ExportBinding {
                        exported: "default".to_string(),
                        origin: ExportOrigin::Local(node_text(&name, source).to_string()),
                        span: Span::of(&name),
                        in_clause: false,
                    },
                    None => ExportBinding {
                        exported: "default".to_string(),
                        origin: ExportOrigin::Default,
                        span: Span::of(&default),
                        in_clause: false,
                    },
                };
                self.exports.push(binding);
            }
            (None, Some(declaration)) => {
                for (name, span) in declared_names(&declaration, source) {
                    self.exports.push(ExportBinding {
                        exported: name.clone(),
                        origin: ExportOrigin::Local(name),
                        span,
                        in_clause: false,
                    });
                }
            }
            _ => {}
        }
    }
}

/// `(specifier, name, alias)` for every specifier of an export clause.
pub fn clause_specifiers<'t>(clause: &Node<'t>) -> Vec<(Node<'t>, Node<'t>, Option<Node<'t>>)> {
    let mut cursor = clause.walk();
    clause
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "export_specifier")
        .filter_map(|specifier| {
            let name = specifier.child_by_field_name("name")?;
            let alias = specifier.child_by_field_name("alias");
            Some((specifier, name, alias))
        })
        .collect()
}

/// Text of an identifier or string module export name.
pub fn module_export_name(node: &Node, source: &str) -> String {
    if node.kind() == "string" {
        string_value(node, source)
    } else {
        node_text(node, source).to_string()
    }
}

/// Names (with identifier spans) introduced by a declaration node.
pub fn declared_names(declaration: &Node, source: &str) -> Vec<(String, Span)> {
    let mut names = Vec::new();
    match declaration.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = declaration.walk();
            for declarator in declaration.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    binding_names(&name, source, &mut names);
                }
            }
        }
        "ambient_declaration" => {
            let mut cursor = declaration.walk();
            let inner: Vec<_> = declaration.named_children(&mut cursor).collect();
            for child in inner {
                names.extend(declared_names(&child, source));
            }
        }
        _ => {
            if let Some(name) = declaration.child_by_field_name("name") {
                if matches!(name.kind(), "identifier" | "type_identifier") {
                    names.push((node_text(&name, source).to_string(), Span::of(&name)));
                }
            }
        }
    }
    names
}

/// Identifiers bound by a (possibly destructuring) binding pattern.
pub fn binding_names(pattern: &Node, source: &str, out: &mut Vec<(String, Span)>) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            out.push((node_text(pattern, source).to_string(), Span::of(pattern)));
        }
        "object_assignment_pattern" | "assignment_pattern" => {
            if let Some(left) = pattern.child_by_field_name("left") {
                binding_names(&left, source, out);
            }
        }
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                binding_names(&value, source, out);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            let children: Vec<_> = pattern.named_children(&mut cursor).collect();
            for child in children {
                binding_names(&child, source, out);
            }
        }
        _ => {}
    }
}
