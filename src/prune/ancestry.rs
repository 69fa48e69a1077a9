//! Re-export chain resolution.
//!
//! For `export { x } from './b'` in `c.ts`, references to `x` land in every
//! file the symbol passes through on its way from its declaration. The
//! ancestry is the set of those intermediate files, so that they are not
//! mistaken for consumers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::analysis::{LanguageService, Reference};
use crate::store::FileStore;

use super::candidates::forwarding_specifiers;

/// Walk the chain of files forwarding a symbol, starting from the specifier
/// `module` written in `origin`.
///
/// Returns `None` when any hop fails to resolve, revisits a file, or is not
/// mentioned in `refs`; a partial chain is never returned.
pub fn resolve_ancestry(
    service: &mut dyn LanguageService,
    store: &dyn FileStore,
    origin: &Path,
    module: &str,
    refs: &[Reference],
) -> Option<BTreeSet<PathBuf>> {
    let mut ancestry = BTreeSet::new();
    let mut from = origin.to_path_buf();
    let mut specifier = module.to_string();

    loop {
        let Some(path) = service.resolve_module(store, &specifier, &from) else {
            trace!(specifier = %specifier, from = %from.display(), "ancestry: unresolved");
            return None;
        };
        if !ancestry.insert(path.clone()) {
            trace!(path = %path.display(), "ancestry: cycle");
            return None;
        }

        let mut here = refs.iter().filter(|r| r.file == path).peekable();
        if here.peek().is_none() {
            trace!(path = %path.display(), "ancestry: no reference in file");
            return None;
        }

        let parsed = service.parse(store, &path).ok()?;
        let forwarding = forwarding_specifiers(&parsed);
        let next = here.find_map(|reference| {
            forwarding
                .iter()
                .find(|f| f.span == reference.span)
                .map(|f| f.module.clone())
        });

        match next {
            Some(module) => {
                from = path;
                specifier = module;
            }
            None => return Some(ancestry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, FixKind, Project, Span};
    use crate::store::MemoryStore;

    /// Resolves through the store but never answers reference queries.
    struct ResolveOnly;

    impl LanguageService for ResolveOnly {
        fn find_references(
            &mut self,
            _store: &dyn FileStore,
            _file: &Path,
            _position: usize,
        ) -> AnalysisResult<Vec<Reference>> {
            Ok(Vec::new())
        }

        fn resolve_module(
            &mut self,
            store: &dyn FileStore,
            specifier: &str,
            from: &Path,
        ) -> Option<PathBuf> {
            crate::analysis::resolver::resolve(store, specifier, from)
        }

        fn apply_fix(
            &mut self,
            store: &dyn FileStore,
            _fix: FixKind,
            file: &Path,
        ) -> AnalysisResult<String> {
            Ok(store.read(file)?)
        }
    }

    fn chain() -> MemoryStore {
        MemoryStore::with_files([
            ("/app/a.ts", "export const x = 1;\n"),
            ("/app/b.ts", "export { x } from './a';\n"),
            ("/app/c.ts", "import { x } from './b';\nexport { x };\n"),
            ("/app/d.ts", "export { x } from './c';\n"),
        ])
    }

    fn paths(set: &BTreeSet<PathBuf>) -> Vec<&str> {
        set.iter().map(|p| p.to_str().unwrap()).collect()
    }

    #[test]
    fn test_walks_to_declaring_file() {
        let store = chain();
        let mut project = Project::new();
        let refs = project
            .find_references(&store, Path::new("/app/d.ts"), 9)
            .unwrap();

        let ancestry =
            resolve_ancestry(&mut project, &store, Path::new("/app/d.ts"), "./c", &refs).unwrap();
        assert_eq!(paths(&ancestry), vec!["/app/a.ts", "/app/b.ts", "/app/c.ts"]);
    }

    #[test]
    fn test_unresolved_module_fails() {
        let store = chain();
        let refs = vec![Reference::new("/app/a.ts", Span::new(13, 14))];
        let ancestry = resolve_ancestry(
            &mut ResolveOnly,
            &store,
            Path::new("/app/b.ts"),
            "./missing",
            &refs,
        );
        assert_eq!(ancestry, None);
    }

    #[test]
    fn test_hop_without_reference_fails() {
        let store = chain();
        // b.ts forwards to a.ts, but nothing was recorded in a.ts
        let refs = vec![Reference::new("/app/b.ts", Span::new(9, 10))];
        let ancestry = resolve_ancestry(
            &mut ResolveOnly,
            &store,
            Path::new("/app/c.ts"),
            "./b",
            &refs,
        );
        assert_eq!(ancestry, None);
    }

    #[test]
    fn test_plain_reference_ends_walk() {
        let store = chain();
        let refs = vec![Reference::new("/app/a.ts", Span::new(13, 14))];
        let ancestry = resolve_ancestry(
            &mut ResolveOnly,
            &store,
            Path::new("/app/b.ts"),
            "./a",
            &refs,
        )
        .unwrap();
        assert_eq!(paths(&ancestry), vec!["/app/a.ts"]);
    }

    #[test]
    fn test_cycle_fails() {
        let store = MemoryStore::with_files([
            ("/app/a.ts", "export { x } from './b';\n"),
            ("/app/b.ts", "export { x } from './a';\n"),
        ]);
        let refs = vec![
            Reference::new("/app/a.ts", Span::new(9, 10)),
            Reference::new("/app/b.ts", Span::new(9, 10)),
        ];
        let ancestry = resolve_ancestry(
            &mut ResolveOnly,
            &store,
            Path::new("/app/a.ts"),
            "./b",
            &refs,
        );
        assert_eq!(ancestry, None);
    }
}
