//! File store abstraction.
//!
//! The pruner never touches the filesystem directly: every read, write and
//! deletion goes through a [`FileStore`], so that a run can target the real
//! project ([`DiskStore`]) or an in-memory snapshot ([`MemoryStore`]) used by
//! `--check` mode and the tests.
//!
//! Every mutation bumps the store's revision. Derived state (parsed trees,
//! the project reference index) compares revisions to know when it is stale.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use unexport::store::{FileStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.insert("/app/src/a.ts", "export const a = 1;\n");
//! assert!(store.exists(Path::new("/app/src/a.ts")));
//!
//! let before = store.revision();
//! store.write(Path::new("/app/src/a.ts"), "const a = 1;\n").unwrap();
//! assert!(store.revision() > before);
//! ```

mod discover;
mod disk;

pub use discover::{discover_sources, is_ignored_dir_name};
pub use disk::DiskStore;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Synchronous storage for project source files.
///
/// All operations are immediately visible to the next read.
pub trait FileStore {
    /// Read the current full text of a file.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if the file is not part of the store.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replace the full text of a file, creating it if needed.
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;

    /// Delete a file.
    fn delete(&mut self, path: &Path) -> io::Result<()>;

    /// Whether the file is currently part of the store.
    fn exists(&self, path: &Path) -> bool;

    /// All files currently in the store, sorted.
    fn files(&self) -> Vec<PathBuf>;

    /// Mutation counter; increases on every write or delete.
    fn revision(&self) -> u64;
}

/// In-memory file store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, String>,
    revision: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, contents)` pairs.
    pub fn with_files<P, S>(files: impl IntoIterator<Item = (P, S)>) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for (path, contents) in files {
            store.insert(path, contents);
        }
        store
    }

    /// Load every source file under `root` into memory.
    ///
    /// Used by `--check` runs, which must never write to disk.
    pub fn snapshot(root: &Path) -> io::Result<Self> {
        let mut store = Self::new();
        for path in discover_sources(root)? {
            let contents = std::fs::read_to_string(&path)?;
            store.insert(path, contents);
        }
        Ok(store)
    }

    /// Insert or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
        self.revision += 1;
    }

    /// Current contents of a file, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Number of files in the store.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found in store: {}", path.display()),
            )
        })
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> io::Result<()> {
        match self.files.remove(path) {
            Some(_) => {
                self.revision += 1;
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found in store: {}", path.display()),
            )),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_read_write() {
        let mut store = MemoryStore::new();
        let path = Path::new("/app/a.ts");

        assert!(!store.exists(path));
        store.write(path, "export const a = 1;").unwrap();
        assert!(store.exists(path));
        assert_eq!(store.read(path).unwrap(), "export const a = 1;");
    }

    #[test]
    fn test_memory_store_missing_file() {
        let store = MemoryStore::new();
        let err = store.read(Path::new("/app/missing.ts")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_store_delete_bumps_revision() {
        let mut store = MemoryStore::with_files([("/app/a.ts", "")]);
        let before = store.revision();

        store.delete(Path::new("/app/a.ts")).unwrap();

        assert!(store.revision() > before);
        assert!(store.is_empty());
        assert!(store.delete(Path::new("/app/a.ts")).is_err());
    }

    #[test]
    fn test_memory_store_files_sorted() {
        let store = MemoryStore::with_files([("/app/b.ts", ""), ("/app/a.ts", "")]);
        assert_eq!(
            store.files(),
            vec![PathBuf::from("/app/a.ts"), PathBuf::from("/app/b.ts")]
        );
    }
}
