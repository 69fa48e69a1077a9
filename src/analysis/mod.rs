//! Source analysis for JavaScript/TypeScript projects.
//!
//! This module provides the [`LanguageService`] capability the pruner is
//! written against, and [`Project`], its tree-sitter implementation.
//!
//! # Features
//!
//! - Parse `.ts`, `.tsx`, `.js`, `.jsx` (and the `m`/`c` variants) with tree-sitter
//! - Find every reference to an exported symbol across the project, following
//!   import bindings, namespace imports, re-export specifiers and wildcard
//!   re-exports
//! - Resolve relative module specifiers the way TypeScript's bundler-style
//!   resolution does (extension probing, `.js` → `.ts`, `index` files)
//! - Apply "delete unused declarations" and "delete unused imports" fixes
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use unexport::analysis::{LanguageService, Project};
//! use unexport::store::MemoryStore;
//!
//! let store = MemoryStore::with_files([
//!     ("/app/util.ts", "export function helper() {}\n"),
//!     ("/app/main.ts", "import { helper } from './util';\nhelper();\n"),
//! ]);
//!
//! let mut project = Project::new();
//! // `helper` starts at byte 16 of util.ts
//! let refs = project
//!     .find_references(&store, Path::new("/app/util.ts"), 16)
//!     .unwrap();
//! assert!(refs.iter().any(|r| r.file == Path::new("/app/main.ts")));
//! ```

pub mod facts;
pub mod fixes;
pub mod project;
pub mod resolver;
pub mod syntax;
pub mod text;

pub use project::Project;
pub use syntax::{SourceLanguage, SourceModule};

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::store::FileStore;

/// Errors that can occur during source analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {path}")]
    ParseError { path: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,

    #[error("File is not part of the project: {0}")]
    FileNotInProject(PathBuf),

    #[error("No symbol at {path}:{position}")]
    NoSymbol { path: String, position: usize },
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// A half-open byte range `[start, end)` in a file's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covered by a tree-sitter node.
    pub fn of(node: &tree_sitter::Node) -> Self {
        Self::new(node.start_byte(), node.end_byte())
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `offset` falls inside this span.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if the two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One occurrence of a symbol somewhere in the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    /// File containing the occurrence.
    pub file: PathBuf,
    /// Byte range of the occurrence in that file.
    pub span: Span,
}

impl Reference {
    pub fn new(file: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }
}

/// Automated fixes the analysis service can apply to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixKind {
    /// Delete top-level declarations nothing references.
    UnusedDeclarations,
    /// Delete import specifiers (and emptied import statements) nothing references.
    UnusedImports,
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixKind::UnusedDeclarations => write!(f, "unused-declarations"),
            FixKind::UnusedImports => write!(f, "unused-imports"),
        }
    }
}

/// The source-analysis capability the pruner depends on.
///
/// Every method receives the file store holding the authoritative project
/// text. Implementations must answer against the store's current content:
/// an edit to any file can shift offsets in that file and change reference
/// sets for symbols in every file importing from it.
pub trait LanguageService {
    /// Parse the current text of `file`.
    fn parse(&mut self, store: &dyn FileStore, file: &Path) -> AnalysisResult<SourceModule> {
        let text = store.read(file)?;
        SourceModule::parse(file, text)
    }

    /// All occurrences of the symbol identified by the byte offset `position`
    /// in `file`, including the identifying occurrence itself.
    fn find_references(
        &mut self,
        store: &dyn FileStore,
        file: &Path,
        position: usize,
    ) -> AnalysisResult<Vec<Reference>>;

    /// Resolve an import/re-export specifier written in `from`.
    fn resolve_module(
        &mut self,
        store: &dyn FileStore,
        specifier: &str,
        from: &Path,
    ) -> Option<PathBuf>;

    /// Content of `file` after one round of `fix`; unchanged when inapplicable.
    fn apply_fix(
        &mut self,
        store: &dyn FileStore,
        fix: FixKind,
        file: &Path,
    ) -> AnalysisResult<String>;
}
