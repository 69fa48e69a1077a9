//! Module specifier resolution.
//!
//! Only relative (`./`, `../`) and absolute specifiers resolve to project
//! files; bare specifiers name packages and resolve to nothing. Candidates
//! are probed against the file store, never the filesystem.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::store::FileStore;

/// Extensions probed when a specifier omits one, in priority order.
const EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// TypeScript sources a JavaScript-flavoured specifier may stand for.
fn typescript_equivalents(ext: &str) -> &'static [&'static str] {
    match ext {
        "js" => &["ts", "tsx", "d.ts"],
        "jsx" => &["tsx"],
        "mjs" => &["mts", "d.mts"],
        "cjs" => &["cts", "d.cts"],
        _ => &[],
    }
}

/// Returns true for specifiers that point into the project rather than a package.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

/// Resolve `specifier`, written in `from`, to a file present in `store`.
pub fn resolve(store: &dyn FileStore, specifier: &str, from: &Path) -> Option<PathBuf> {
    if !is_relative(specifier) {
        return None;
    }
    let dir = from.parent()?;
    let base = normalize(&dir.join(specifier));
    candidates(&base)
        .into_iter()
        .find(|candidate| store.exists(candidate))
}

/// Lexically normalize a path, removing `.` and resolving `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component.as_os_str());
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut path: OsString = base.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

fn candidates(base: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![base.to_path_buf()];

    if let Some(ext) = base.extension().and_then(|e| e.to_str()) {
        let stem = base.with_extension("");
        for replacement in typescript_equivalents(ext) {
            candidates.push(with_suffix(&stem, replacement));
        }
    }

    for ext in EXTENSIONS {
        candidates.push(with_suffix(base, ext));
    }
    for ext in EXTENSIONS {
        candidates.push(with_suffix(&base.join("index"), ext));
    }
    candidates
}
