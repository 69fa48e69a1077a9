//! File store backed by the real filesystem.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{discover_sources, FileStore};

/// Filesystem store scoped to a project root.
///
/// The set of project files is discovered once on open and then kept in
/// sync with writes and deletions made through the store. Contents are always
/// read from disk.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
    files: BTreeSet<PathBuf>,
    revision: u64,
}

impl DiskStore {
    /// Open a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root doesn't exist or can't be canonicalized.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        let files = discover_sources(&root)?.into_iter().collect();
        Ok(Self {
            root,
            files,
            revision: 0,
        })
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(&self, path: &Path) -> io::Result<()> {
        if path.starts_with(&self.root) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path {} is outside project root {}",
                    path.display(),
                    self.root.display()
                ),
            ))
        }
    }
}

impl FileStore for DiskStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.validate(path)?;
        fs::read_to_string(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        self.validate(path)?;
        fs::write(path, contents)?;
        self.files.insert(path.to_path_buf());
        self.revision += 1;
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> io::Result<()> {
        self.validate(path)?;
        fs::remove_file(path)?;
        self.files.remove(path);
        self.revision += 1;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn files(&self) -> Vec<PathBuf> {
        self.files.iter().cloned().collect()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
