//! Removal of unused exports.
//!
//! The [`Pruner`] drives a fixed-point loop per file: parse the current text,
//! classify its exports ([`candidates`]), decide which are unused
//! ([`usage`], [`ancestry`]), cut them out ([`edits`]) and start over, until
//! a scan finds nothing left to remove. Files whose exports all go away can
//! be deleted, and the remaining ones can be tidied by the [`cleanup`] pass.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use unexport::analysis::Project;
//! use unexport::prune::{NoopTracker, PruneOptions, Pruner};
//! use unexport::store::MemoryStore;
//!
//! let store = MemoryStore::with_files([
//!     ("/app/util.ts", "export function helper() {}\nexport function shared() {}\n"),
//!     ("/app/main.ts", "import { shared } from './util';\nshared();\n"),
//! ]);
//!
//! let mut pruner = Pruner::new(Project::new(), store, NoopTracker, PruneOptions::default());
//! pruner.prune_file(Path::new("/app/util.ts")).unwrap();
//!
//! assert_eq!(
//!     pruner.store().get("/app/util.ts"),
//!     Some("function helper() {}\nexport function shared() {}\n")
//! );
//! ```

pub mod ancestry;
pub mod candidates;
pub mod cleanup;
pub mod driver;
pub mod edits;
pub mod tracker;
pub mod usage;

pub use crate::analysis::text::TextChange;
pub use candidates::{Candidate, CandidateKind, ExportScan, DEFAULT_SKIP_MARKER};
pub use driver::{FileOutcome, PruneOptions, Pruner, RunSummary};
pub use tracker::{EditTracker, FileEdits, LogTracker, NoopTracker, RecordingTracker, Removal};
pub use usage::Verdict;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::AnalysisError;

/// Errors that abort pruning of a single file.
#[derive(Error, Debug)]
pub enum PruneError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{}: syntax errors, refusing to edit", path.display())]
    Syntax { path: PathBuf },

    #[error("{}:{offset}: exported declaration has no `export` keyword", path.display())]
    MissingExportKeyword { path: PathBuf, offset: usize },

    #[error("{}:{offset}: export specifier outside an export clause", path.display())]
    MissingClause { path: PathBuf, offset: usize },

    #[error("{}: edit batch left the text unchanged", path.display())]
    NoProgress { path: PathBuf },
}

/// Result type for pruning operations.
pub type PruneResult<T> = Result<T, PruneError>;
