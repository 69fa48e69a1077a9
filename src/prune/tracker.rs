//! Observers for edit sessions.
//!
//! Trackers are told what the pruner did; they never influence what it does.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

/// One excised piece of an export, located in the text it was removed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// 1-based line of the removed code.
    pub line: usize,
    /// 1-based column of the removed code.
    pub column: usize,
    /// Byte offset of the removed code.
    pub offset: usize,
    /// The removed source text.
    pub code: String,
}

/// Receives edit-session events, in the order the edits happen.
pub trait EditTracker {
    /// A file is about to be edited; `original` is its current text.
    fn start(&mut self, file: &Path, original: &str);

    /// The edit session for `file` is over.
    fn end(&mut self, file: &Path);

    /// An export was removed from `file`.
    fn removed(&mut self, file: &Path, removal: Removal);

    /// `file` was deleted.
    fn deleted(&mut self, file: &Path);
}

impl<T: EditTracker + ?Sized> EditTracker for &mut T {
    fn start(&mut self, file: &Path, original: &str) {
        (**self).start(file, original);
    }

    fn end(&mut self, file: &Path) {
        (**self).end(file);
    }

    fn removed(&mut self, file: &Path, removal: Removal) {
        (**self).removed(file, removal);
    }

    fn deleted(&mut self, file: &Path) {
        (**self).deleted(file);
    }
}

/// Forwards every event to both trackers.
impl<A: EditTracker, B: EditTracker> EditTracker for (A, B) {
    fn start(&mut self, file: &Path, original: &str) {
        self.0.start(file, original);
        self.1.start(file, original);
    }

    fn end(&mut self, file: &Path) {
        self.0.end(file);
        self.1.end(file);
    }

    fn removed(&mut self, file: &Path, removal: Removal) {
        self.0.removed(file, removal.clone());
        self.1.removed(file, removal);
    }

    fn deleted(&mut self, file: &Path) {
        self.0.deleted(file);
        self.1.deleted(file);
    }
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl EditTracker for NoopTracker {
    fn start(&mut self, _file: &Path, _original: &str) {}
    fn end(&mut self, _file: &Path) {}
    fn removed(&mut self, _file: &Path, _removal: Removal) {}
    fn deleted(&mut self, _file: &Path) {}
}

/// Mirrors events into the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracker;

impl EditTracker for LogTracker {
    fn start(&mut self, file: &Path, original: &str) {
        debug!(file = %file.display(), bytes = original.len(), "editing");
    }

    fn end(&mut self, file: &Path) {
        debug!(file = %file.display(), "done editing");
    }

    fn removed(&mut self, file: &Path, removal: Removal) {
        info!(
            "{}:{}:{} removed `{}`",
            file.display(),
            removal.line,
            removal.column,
            first_line(&removal.code)
        );
    }

    fn deleted(&mut self, file: &Path) {
        info!("{} deleted", file.display());
    }
}

fn first_line(code: &str) -> &str {
    code.trim().lines().next().unwrap_or("")
}

/// Edits made to one file across all of its sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEdits {
    pub path: PathBuf,
    pub removals: Vec<Removal>,
    pub deleted: bool,
}

/// Collects events into per-file records, in first-edit order.
#[derive(Debug, Default, Clone)]
pub struct RecordingTracker {
    files: Vec<FileEdits>,
    open: Option<PathBuf>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files with at least one removal or a deletion.
    pub fn edited(&self) -> impl Iterator<Item = &FileEdits> {
        self.files
            .iter()
            .filter(|file| file.deleted || !file.removals.is_empty())
    }

    /// Whether a session is currently open.
    pub fn in_session(&self) -> bool {
        self.open.is_some()
    }

    pub fn into_files(self) -> Vec<FileEdits> {
        self.files
            .into_iter()
            .filter(|file| file.deleted || !file.removals.is_empty())
            .collect()
    }

    fn entry(&mut self, file: &Path) -> &mut FileEdits {
        let idx = match self.files.iter().position(|f| f.path == file) {
            Some(idx) => idx,
            None => {
                self.files.push(FileEdits {
                    path: file.to_path_buf(),
                    removals: Vec::new(),
                    deleted: false,
                });
                self.files.len() - 1
            }
        };
        &mut self.files[idx]
    }
}

impl EditTracker for RecordingTracker {
    fn start(&mut self, file: &Path, _original: &str) {
        self.entry(file);
        self.open = Some(file.to_path_buf());
    }

    fn end(&mut self, _file: &Path) {
        self.open = None;
    }

    fn removed(&mut self, file: &Path, removal: Removal) {
        self.entry(file).removals.push(removal);
    }

    fn deleted(&mut self, file: &Path) {
        self.entry(file).deleted = true;
    }
}
