//! Single-file code fixes.
//!
//! Both fixes look only at the file itself: a top-level declaration that is
//! not exported and whose name occurs nowhere but its own declaration is
//! dead, and so is an import binding whose local name never occurs.

use tree_sitter::Node;

use super::facts::{declared_names, ExportOrigin, ModuleFacts};
use super::syntax::{child_of_kind, node_text, SourceModule};
use super::text::{apply_changes, line_extent, TextChange};
use super::Span;

/// Top-level statement kinds the unused-declaration fix may delete.
const DECLARATION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
    "lexical_declaration",
    "variable_declaration",
];

/// Delete top-level declarations nothing references.
pub fn remove_unused_declarations(module: &SourceModule) -> String {
    let facts = ModuleFacts::extract(module);
    let text = module.text();
    let root = module.root();

    let mut changes = Vec::new();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if !DECLARATION_KINDS.contains(&statement.kind()) {
            continue;
        }
        let names = declared_names(&statement, text);
        if names.is_empty() {
            continue;
        }
        let dead = names
            .iter()
            .all(|(name, _)| facts.occurrences_of(name).len() <= 1 && !exported(&facts, name));
        if dead {
            changes.push(TextChange::delete(line_extent(text, Span::of(&statement))));
        }
    }

    apply_changes(text, &changes)
}

/// Delete import bindings nothing references; drop emptied import statements.
pub fn remove_unused_imports(module: &SourceModule) -> String {
    let facts = ModuleFacts::extract(module);
    let text = module.text();
    let root = module.root();
    let used = |local: &str| !facts.occurrences_of(local).is_empty() || exported(&facts, local);

    let mut changes = Vec::new();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "import_statement" {
            continue;
        }
        // side-effect imports have no clause and always stay
        let Some(clause) = child_of_kind(&statement, "import_clause") else {
            continue;
        };
        if let Some(change) = prune_import_clause(&statement, &clause, text, &used) {
            changes.push(change);
        }
    }

    apply_changes(text, &changes)
}

fn prune_import_clause(
    statement: &Node,
    clause: &Node,
    text: &str,
    used: &dyn Fn(&str) -> bool,
) -> Option<TextChange> {
    let mut dropped = false;
    let mut default = None;
    let mut namespace = None;
    let mut named = Vec::new();

    let mut cursor = clause.walk();
    for child in clause.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                let local = node_text(&child, text);
                if used(local) {
                    default = Some(local);
                } else {
                    dropped = true;
                }
            }
            "namespace_import" => {
                let local = child_of_kind(&child, "identifier").map(|n| node_text(&n, text));
                if local.is_some_and(used) {
                    namespace = Some(node_text(&child, text));
                } else {
                    dropped = true;
                }
            }
            "named_imports" => {
                let mut specifiers = child.walk();
                for specifier in child.named_children(&mut specifiers) {
                    if specifier.kind() != "import_specifier" {
                        continue;
                    }
                    let local = specifier
                        .child_by_field_name("alias")
                        .or_else(|| specifier.child_by_field_name("name"))
                        .map(|n| node_text(&n, text));
                    if local.is_some_and(used) {
                        named.push(node_text(&specifier, text));
                    } else {
                        dropped = true;
                    }
                }
            }
            _ => {}
        }
    }

    if !dropped {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    parts.extend(default.map(str::to_string));
    parts.extend(namespace.map(str::to_string));
    if !named.is_empty() {
        parts.push(format!("{{ {} }}", named.join(", ")));
    }

    Some(if parts.is_empty() {
        TextChange::delete(line_extent(text, Span::of(statement)))
    } else {
        TextChange::replace(Span::of(clause), parts.join(", "))
    })
}

/// Whether `name` leaves the file through an export clause.
fn exported(facts: &ModuleFacts, name: &str) -> bool {
    facts
        .exports
        .iter()
        .any(|export| matches!(&export.origin, ExportOrigin::Local(local) if local == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declarations(source: &str) -> String {
        remove_unused_declarations(&SourceModule::parse("/app/a.ts", source).unwrap())
    }

    fn imports(source: &str) -> String {
        remove_unused_imports(&SourceModule::parse("/app/a.ts", source).unwrap())
    }

    #[test]
    fn test_removes_unreferenced_declarations() {
        let source = "function dead() {}\nclass Dead {}\ninterface I {}\ntype T = string;\nenum E { A }\nconst x = 1;\nfunction live() {}\nlive();\n";
        assert_eq!(declarations(source), "function live() {}\nlive();\n");
    }

    #[test]
    fn test_keeps_exported_declarations() {
        let source = "export function a() {}\nfunction b() {}\nconst c = 1;\nexport { b };\nexport default c;\n";
        assert_eq!(declarations(source), source);
    }

    #[test]
    fn test_keeps_partially_used_variable_statement() {
        let source = "const a = 1, b = 2;\nconsole.log(b);\n";
        assert_eq!(declarations(source), source);
    }

    #[test]
    fn test_removes_unused_import_specifiers() {
        let source = "import { a, b as c, d } from './m';\nimport Def, * as ns from './n';\nimport './side-effect';\nc(d);\n";
        assert_eq!(
            imports(source),
            "import { b as c, d } from './m';\nimport './side-effect';\nc(d);\n"
        );
    }

    #[test]
    fn test_keeps_default_when_named_are_unused() {
        let source = "import React, { useState } from 'react';\nReact.render();\n";
        assert_eq!(imports(source), "import React from 'react';\nReact.render();\n");
    }

    #[test]
    fn test_import_reexported_through_clause_is_used() {
        let source = "import { a } from './a';\nexport { a };\n";
        assert_eq!(imports(source), source);
    }
}
