//! Export candidate classification.
//!
//! Walks the top-level statements of one parsed file and yields every export
//! that may be removed, in document order. Wildcard re-exports, namespace
//! re-exports, `export =`, enums, namespaces and ambient declarations count
//! as exports but are never candidates.

use tree_sitter::Node;

use crate::analysis::facts::{clause_specifiers, declared_names, module_export_name};
use crate::analysis::syntax::{child_of_kind, leading_comments, node_text, string_value};
use crate::analysis::{SourceModule, Span};

/// Comment marker that protects the export following it.
pub const DEFAULT_SKIP_MARKER: &str = "unexport-skip";

/// Syntactic kind of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Variable,
    Function,
    Class,
    Interface,
    TypeAlias,
    /// `export default <expr>`, including anonymous functions and classes
    ///
    /// Removed as a whole statement, anonymous function and class bodies
    /// included.
    ExportAssignment,
    /// One item of an `export { ... }` clause
    Specifier,
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Function => write!(f, "function"),
            Self::Class => write!(f, "class"),
            Self::Interface => write!(f, "interface"),
            Self::TypeAlias => write!(f, "type alias"),
            Self::ExportAssignment => write!(f, "default export"),
            Self::Specifier => write!(f, "export specifier"),
        }
    }
}

/// The `export { ... }` clause a specifier belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Span of the braces and everything between them.
    pub span: Span,
    /// Span of every specifier in the clause, in order.
    pub specifiers: Vec<Span>,
    /// Span of every separating comma, trailing one included.
    pub commas: Vec<Span>,
}

/// An exported declaration that may be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Exported names (several for `export const a = 1, b = 2`).
    pub names: Vec<String>,
    /// Identifier spans of each exported name, parallel to `names`.
    pub identifiers: Vec<Span>,
    /// The whole `export` statement.
    pub statement: Span,
    /// The `export` keyword, if the statement has one.
    pub export_keyword: Option<Span>,
    /// The declaration after the export marker, or the specifier itself.
    pub node: Span,
    /// Module the symbol is forwarded from, for re-exporting specifiers.
    pub module: Option<String>,
    /// Enclosing clause, for specifiers.
    pub clause: Option<Clause>,
}

impl Candidate {
    pub fn is_specifier(&self) -> bool {
        self.kind == CandidateKind::Specifier
    }

    /// Offsets to query references from, one per exported name.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.identifiers.iter().map(|span| span.start)
    }

    /// Display name, `a, b` for multi-name statements.
    pub fn label(&self) -> String {
        self.names.join(", ")
    }
}

/// Result of classifying one file.
#[derive(Debug, Clone, Default)]
pub struct ExportScan {
    /// Removable exports, in document order.
    pub candidates: Vec<Candidate>,
    /// The file contains `export * from '...'`.
    pub has_wildcard: bool,
    /// Every export item of the file, candidate or not.
    pub export_count: usize,
    /// Candidates protected by the skip marker.
    pub skipped: usize,
}

/// A specifier forwarding a symbol from another module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarding {
    /// Span of the specifier's local name.
    pub span: Span,
    pub module: String,
}

/// Classify the exports of `module`.
pub fn scan_exports(module: &SourceModule, skip_marker: &str) -> ExportScan {
    let text = module.text();
    let root = module.root();
    let imports = import_modules(&root, text);
    let overloads = overloaded_functions(&root, text);
    let mut scan = ExportScan::default();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let skip = is_marked(&statement, text, skip_marker);

        if let Some(clause) = child_of_kind(&statement, "export_clause") {
            for candidate in specifier_candidates(&statement, &clause, text, &imports) {
                scan.export_count += 1;
                let specifier_skip = specifier_node(&clause, candidate.node)
                    .is_some_and(|node| is_marked(&node, text, skip_marker));
                if skip || specifier_skip {
                    scan.skipped += 1;
                } else {
                    scan.candidates.push(candidate);
                }
            }
            continue;
        }

        if child_of_kind(&statement, "*").is_some()
            && child_of_kind(&statement, "namespace_export").is_none()
        {
            scan.has_wildcard = true;
        }
        scan.export_count += 1;

        match declaration_candidate(&statement, text) {
            Some(candidate) if is_overloaded(&candidate, text, &overloads) => {}
            Some(_) if skip => scan.skipped += 1,
            Some(candidate) => scan.candidates.push(candidate),
            None => {}
        }
    }

    scan
}

/// Every forwarding specifier of `module`, skip markers notwithstanding.
pub fn forwarding_specifiers(module: &SourceModule) -> Vec<Forwarding> {
    let text = module.text();
    let root = module.root();
    let imports = import_modules(&root, text);

    let mut found = Vec::new();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        if let Some(clause) = child_of_kind(&statement, "export_clause") {
            for candidate in specifier_candidates(&statement, &clause, text, &imports) {
                if let (Some(module), Some(&span)) =
                    (candidate.module, candidate.identifiers.first())
                {
                    found.push(Forwarding { span, module });
                }
            }
        }
    }
    found
}

/// Names of functions declared with overload signatures.
fn overloaded_functions(root: &Node, text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        let signature = match statement.kind() {
            "function_signature" => Some(statement),
            "export_statement" => statement
                .child_by_field_name("declaration")
                .filter(|declaration| declaration.kind() == "function_signature"),
            _ => None,
        };
        if let Some(name) = signature.and_then(|s| s.child_by_field_name("name")) {
            names.push(node_text(&name, text).to_string());
        }
    }
    names
}

/// An overloaded implementation shares its `export` with its signatures, so
/// it is kept along with them.
fn is_overloaded(candidate: &Candidate, text: &str, overloads: &[String]) -> bool {
    candidate.kind == CandidateKind::Function
        && candidate.identifiers.iter().any(|span| {
            text.get(span.start..span.end)
                .is_some_and(|name| overloads.iter().any(|o| o == name))
        })
}

fn specifier_node<'t>(clause: &Node<'t>, span: Span) -> Option<Node<'t>> {
    clause_specifiers(clause)
        .into_iter()
        .map(|(specifier, _, _)| specifier)
        .find(|specifier| Span::of(specifier) == span)
}

/// Local name → module specifier, for every import binding of the file.
fn import_modules(root: &Node, text: &str) -> Vec<(String, String)> {
    let mut bindings = Vec::new();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "import_statement" {
            continue;
        }
        let (Some(source), Some(clause)) = (
            statement.child_by_field_name("source"),
            child_of_kind(&statement, "import_clause"),
        ) else {
            continue;
        };
        let module = string_value(&source, text);
        collect_import_locals(&clause, text, &module, &mut bindings);
    }
    bindings
}

fn collect_import_locals(clause: &Node, text: &str, module: &str, out: &mut Vec<(String, String)>) {
    let mut cursor = clause.walk();
    for child in clause.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => out.push((node_text(&child, text).to_string(), module.to_string())),
            "namespace_import" => {
                if let Some(name) = child_of_kind(&child, "identifier") {
                    out.push((node_text(&name, text).to_string(), module.to_string()));
                }
            }
            "named_imports" => {
                let mut specifiers = child.walk();
                for specifier in child.named_children(&mut specifiers) {
                    let local = specifier
                        .child_by_field_name("alias")
                        .or_else(|| specifier.child_by_field_name("name"));
                    if let Some(local) = local {
                        out.push((node_text(&local, text).to_string(), module.to_string()));
                    }
                }
            }
            _ => {}
        }
    }
}

fn specifier_candidates(
    statement: &Node,
    clause: &Node,
    text: &str,
    imports: &[(String, String)],
) -> Vec<Candidate> {
    let from = statement
        .child_by_field_name("source")
        .map(|source| string_value(&source, text));
    let specifiers = clause_specifiers(clause);
    let mut cursor = clause.walk();
    let commas = clause
        .children(&mut cursor)
        .filter(|child| child.kind() == ",")
        .map(|comma| Span::of(&comma))
        .collect();
    let clause_info = Clause {
        span: Span::of(clause),
        specifiers: specifiers.iter().map(|(spec, _, _)| Span::of(spec)).collect(),
        commas,
    };

    specifiers
        .iter()
        .map(|(specifier, name, alias)| {
            let local = module_export_name(name, text);
            let exported = alias
                .as_ref()
                .map(|alias| module_export_name(alias, text))
                .unwrap_or_else(|| local.clone());
            let module = from.clone().or_else(|| {
                imports
                    .iter()
                    .find(|(binding, _)| *binding == local)
                    .map(|(_, module)| module.clone())
            });
            Candidate {
                kind: CandidateKind::Specifier,
                names: vec![exported],
                identifiers: vec![Span::of(name)],
                statement: Span::of(statement),
                export_keyword: child_of_kind(statement, "export").map(|kw| Span::of(&kw)),
                node: Span::of(specifier),
                module,
                clause: Some(clause_info.clone()),
            }
        })
        .collect()
}

fn declaration_candidate(statement: &Node, text: &str) -> Option<Candidate> {
    let default = child_of_kind(statement, "default");
    let target = statement
        .child_by_field_name("declaration")
        .or_else(|| statement.child_by_field_name("value"))?;

    let kind = match target.kind() {
        "lexical_declaration" | "variable_declaration" if default.is_none() => {
            CandidateKind::Variable
        }
        "function_declaration" | "generator_function_declaration" => CandidateKind::Function,
        "class_declaration" | "abstract_class_declaration" => CandidateKind::Class,
        "interface_declaration" if default.is_none() => CandidateKind::Interface,
        "type_alias_declaration" if default.is_none() => CandidateKind::TypeAlias,
        "function_expression" | "function" | "generator_function" | "class"
            if default.is_some() && target.child_by_field_name("name").is_some() =>
        {
            if target.kind() == "class" {
                CandidateKind::Class
            } else {
                CandidateKind::Function
            }
        }
        _ if default.is_some() => CandidateKind::ExportAssignment,
        _ => return None,
    };

    let (names, identifiers) = match (kind, default) {
        (CandidateKind::ExportAssignment, Some(default)) => {
            (vec!["default".to_string()], vec![Span::of(&default)])
        }
        (_, Some(_)) => {
            let name = target.child_by_field_name("name")?;
            (vec!["default".to_string()], vec![Span::of(&name)])
        }
        (_, None) => {
            let declared = declared_names(&target, text);
            if declared.is_empty() {
                return None;
            }
            declared.into_iter().unzip()
        }
    };

    Some(Candidate {
        kind,
        names,
        identifiers,
        statement: Span::of(statement),
        export_keyword: child_of_kind(statement, "export").map(|kw| Span::of(&kw)),
        node: Span::of(&target),
        module: None,
        clause: None,
    })
}

/// Whether a comment directly preceding `node` carries `marker`.
fn is_marked(node: &Node, text: &str, marker: &str) -> bool {
    leading_comments(node)
        .iter()
        .any(|comment| node_text(comment, text).contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> ExportScan {
        let module = SourceModule::parse("/app/test.ts", source).unwrap();
        scan_exports(&module, DEFAULT_SKIP_MARKER)
    }

    fn kinds(scan: &ExportScan) -> Vec<CandidateKind> {
        scan.candidates.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_declaration_kinds() {
        let scan = scan(
            "export const a = 1;\nexport function f() {}\nexport class C {}\nexport interface I {}\nexport type T = number;\nconst local = 2;\n",
        );
        assert_eq!(
            kinds(&scan),
            vec![
                CandidateKind::Variable,
                CandidateKind::Function,
                CandidateKind::Class,
                CandidateKind::Interface,
                CandidateKind::TypeAlias,
            ]
        );
        assert_eq!(scan.export_count, 5);
        assert!(!scan.has_wildcard);

        let function = &scan.candidates[1];
        assert_eq!(function.names, vec!["f"]);
        assert_eq!(function.positions().collect::<Vec<_>>(), vec![36]);
        assert_eq!(function.export_keyword, Some(Span::new(20, 26)));
        assert_eq!(function.node.start, 27);
    }

    #[test]
    fn test_multi_name_variable() {
        let scan = scan("export const a = 1, b = 2;\n");
        let candidate = &scan.candidates[0];
        assert_eq!(candidate.names, vec!["a", "b"]);
        assert_eq!(candidate.positions().collect::<Vec<_>>(), vec![13, 20]);
        assert_eq!(candidate.label(), "a, b");
    }

    #[test]
    fn test_default_exports() {
        let scan = scan("export default { answer: 42 };\n");
        assert_eq!(kinds(&scan), vec![CandidateKind::ExportAssignment]);
        assert_eq!(scan.candidates[0].identifiers, vec![Span::new(7, 14)]);

        let scan = scan_exports(
            &SourceModule::parse("/app/a.ts", "export default function main() {}\n").unwrap(),
            DEFAULT_SKIP_MARKER,
        );
        assert_eq!(kinds(&scan), vec![CandidateKind::Function]);
        assert_eq!(scan.candidates[0].identifiers, vec![Span::new(24, 28)]);

        let scan = scan_exports(
            &SourceModule::parse("/app/a.ts", "export default class {}\n").unwrap(),
            DEFAULT_SKIP_MARKER,
        );
        assert_eq!(kinds(&scan), vec![CandidateKind::ExportAssignment]);
    }

    #[test]
    fn test_specifiers() {
        let scan = scan("const a = 1, b = 2;\nexport { a, b as c };\nexport { x } from './x';\n");
        assert_eq!(scan.candidates.len(), 3);
        assert!(scan.candidates.iter().all(Candidate::is_specifier));
        assert_eq!(scan.candidates[1].names, vec!["c"]);
        assert_eq!(scan.candidates[0].module, None);
        assert_eq!(scan.candidates[2].module.as_deref(), Some("./x"));

        let clause = scan.candidates[0].clause.as_ref().unwrap();
        assert_eq!(clause.specifiers.len(), 2);
        assert_eq!(scan.export_count, 3);
    }

    #[test]
    fn test_import_bound_specifier_forwards() {
        let scan = scan("import { x } from './x';\nexport { x };\n");
        assert_eq!(scan.candidates[0].module.as_deref(), Some("./x"));
    }

    #[test]
    fn test_wildcard_and_other_exports() {
        let scan = scan(
            "export * from './a';\nexport * as b from './b';\nexport enum E { A }\nexport const c = 1;\n",
        );
        assert!(scan.has_wildcard);
        assert_eq!(kinds(&scan), vec![CandidateKind::Variable]);
        assert_eq!(scan.export_count, 4);

        let scan = self::scan("export * as b from './b';\n");
        assert!(!scan.has_wildcard);
    }

    #[test]
    fn test_skip_marker() {
        let scan = scan(
            "// unexport-skip\nexport const a = 1;\n/* keep: unexport-skip */\nexport { b };\nexport {\n  // unexport-skip\n  c,\n  d,\n};\nexport const e = 2;\n",
        );
        let names: Vec<_> = scan.candidates.iter().map(|c| c.label()).collect();
        assert_eq!(names, vec!["d", "e"]);
        assert_eq!(scan.skipped, 3);
        assert_eq!(scan.export_count, 5);
    }

    #[test]
    fn test_overloaded_functions_are_kept() {
        let scan = scan(
            "export function f(a: string): void;\nexport function f(a: number): void;\nexport function f(a: any) {}\nexport function g() {}\n",
        );
        let names: Vec<_> = scan.candidates.iter().map(|c| c.label()).collect();
        assert_eq!(names, vec!["g"]);
        assert_eq!(scan.export_count, 4);
    }

    #[test]
    fn test_trailing_and_detached_markers_do_not_protect() {
        let scan = scan(
            "export const a = 1; // unexport-skip\nexport const b = 2;\n// unexport-skip\n\nexport const c = 3;\n",
        );
        let names: Vec<_> = scan.candidates.iter().map(|c| c.label()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(scan.skipped, 0);
    }

    #[test]
    fn test_forwarding_specifiers_ignore_marker() {
        let module = SourceModule::parse(
            "/app/b.ts",
            "import { y } from './y';\n// unexport-skip\nexport { x } from './x';\nexport { y };\nconst z = 1;\nexport { z };\n",
        )
        .unwrap();
        let found = forwarding_specifiers(&module);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].module, "./x");
        assert_eq!(module.text()[found[0].span.start..found[0].span.end].to_string(), "x");
        assert_eq!(found[1].module, "./y");
    }
}
