//! Source file discovery.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::analysis::SourceLanguage;

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "coverage",
    ".turbo",
];

/// Returns true for directory names that never contain project sources.
pub fn is_ignored_dir_name(name: &str) -> bool {
    IGNORED_DIRS.contains(&name)
}

fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && is_ignored_dir_name(&entry.file_name().to_string_lossy())
}

/// Find every JavaScript/TypeScript source file under `root`, sorted.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
pub fn discover_sources(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Project root is not a directory: {}", root.display()),
        ));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| SourceLanguage::from_path(path).is_some())
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_skips_node_modules_and_other_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/a.ts"), "").unwrap();
        fs::write(root.join("src/b.tsx"), "").unwrap();
        fs::write(root.join("src/readme.md"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();

        let files = discover_sources(root).unwrap();

        assert_eq!(files, vec![root.join("src/a.ts"), root.join("src/b.tsx")]);
    }

    #[test]
    fn test_discover_missing_root() {
        assert!(discover_sources(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn test_ignored_dir_names() {
        assert!(is_ignored_dir_name("node_modules"));
        assert!(is_ignored_dir_name(".git"));
        assert!(!is_ignored_dir_name("src"));
    }
}
