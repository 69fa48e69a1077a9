//! Tree-sitter parsing for JavaScript/TypeScript sources.

use std::path::{Path, PathBuf};

use tree_sitter::{Language, Node, Parser, Tree};

use super::{AnalysisError, AnalysisResult, Span};

/// Language type for file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    TypeScript,
    Tsx,
    Jsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "jsx" => Some(SourceLanguage::Jsx),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Determine language from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get tree-sitter language for this source language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => {
                tree_sitter_javascript::LANGUAGE.into()
            }
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Returns true for TypeScript declaration files (`.d.ts`, `.d.mts`, `.d.cts`).
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
        })
}

/// A parsed source file: its path, full text and syntax tree.
///
/// Modules are cheap, disposable snapshots. Once the file's text changes in
/// the store, every span taken from an older module is stale.
pub struct SourceModule {
    path: PathBuf,
    text: String,
    tree: Tree,
    language: SourceLanguage,
}

impl std::fmt::Debug for SourceModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceModule")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("len", &self.text.len())
            .finish()
    }
}

impl SourceModule {
    /// Parse `text` as the contents of `path`, picking the grammar from the extension.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> AnalysisResult<Self> {
        let path = path.into();
        let text = text.into();

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = SourceLanguage::from_extension(ext)
            .ok_or_else(|| AnalysisError::UnsupportedFileType(ext.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|_| AnalysisError::LanguageInit)?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| AnalysisError::ParseError {
                path: path.display().to_string(),
            })?;

        Ok(Self {
            path,
            text,
            tree,
            language,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// The `program` node.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns true if tree-sitter had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Source text covered by a node of this module.
    pub fn node_text(&self, node: &Node) -> &str {
        node_text(node, &self.text)
    }
}

/// Extract the text content of a node.
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Extract string value (removes quotes).
pub fn string_value(node: &Node, source: &str) -> String {
    node_text(node, source)
        .trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`'])
        .to_string()
}

/// First direct child (named or anonymous) of the given kind.
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Span of a node's `name` field, if present.
pub fn name_span(node: &Node) -> Option<Span> {
    node.child_by_field_name("name").map(|name| Span::of(&name))
}

/// Comments directly preceding `node` among its siblings.
///
/// The run stops at a blank line, and at a comment trailing the code of an
/// earlier sibling on the same line.
pub fn leading_comments<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut comments = Vec::new();
    let mut next_row = node.start_position().row;
    let mut current = node.prev_named_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 < next_row {
            break;
        }
        let before = sibling.prev_named_sibling();
        let trailing = before.is_some_and(|b| {
            b.kind() != "comment" && b.end_position().row == sibling.start_position().row
        });
        if trailing {
            break;
        }
        comments.push(sibling);
        next_row = sibling.start_position().row;
        current = before;
    }
    comments.reverse();
    comments
}

/// 1-based line and column of a byte offset.
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |idx| idx + 1);
    (line, offset - line_start + 1)
}
