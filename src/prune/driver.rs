//! Fixed-point removal driver.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::analysis::text::apply_changes;
use crate::analysis::LanguageService;
use crate::store::FileStore;

use super::candidates::{scan_exports, Candidate, DEFAULT_SKIP_MARKER};
use super::cleanup::run_cleanup;
use super::edits::plan_batch;
use super::tracker::EditTracker;
use super::usage::classify;
use super::{PruneError, PruneResult};

/// Knobs for a pruning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOptions {
    /// Delete files once every export they have is unused.
    pub delete_files: bool,
    /// Run the unused-declaration/unused-import fixes on stabilized files.
    pub cleanup: bool,
    /// Repeat [`Pruner::run`] over the targets until a round changes nothing.
    pub recursive: bool,
    /// Cap on rounds when `recursive` is set.
    pub max_rounds: usize,
    /// Comment marker protecting an export from removal.
    pub skip_marker: String,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            delete_files: false,
            cleanup: false,
            recursive: false,
            max_rounds: 10,
            skip_marker: DEFAULT_SKIP_MARKER.to_string(),
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Nothing was removed (cleanup may still have run).
    Unchanged,
    /// `removed` exports were cut over `passes` edit passes.
    Pruned { removed: usize, passes: usize },
    /// Every export was unused and the file was deleted.
    Deleted,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, FileOutcome::Unchanged)
    }
}

/// Outcome of a multi-file run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Outcome per processed target, in processing order (last round wins).
    pub outcomes: Vec<(PathBuf, FileOutcome)>,
    /// Targets that failed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
    /// Rounds executed.
    pub rounds: usize,
}

impl RunSummary {
    pub fn removed(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                FileOutcome::Pruned { removed, .. } => *removed,
                _ => 0,
            })
            .sum()
    }

    pub fn deleted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == FileOutcome::Deleted)
            .count()
    }

    pub fn changed(&self) -> bool {
        self.outcomes.iter().any(|(_, outcome)| outcome.changed())
    }

    fn record(&mut self, path: &Path, outcome: FileOutcome) {
        match self.outcomes.iter_mut().find(|(p, _)| p.as_path() == path) {
            Some((_, existing)) => *existing = merge(*existing, outcome),
            None => self.outcomes.push((path.to_path_buf(), outcome)),
        }
    }
}

fn merge(before: FileOutcome, after: FileOutcome) -> FileOutcome {
    match (before, after) {
        (_, FileOutcome::Deleted) | (FileOutcome::Deleted, _) => FileOutcome::Deleted,
        (
            FileOutcome::Pruned { removed, passes },
            FileOutcome::Pruned {
                removed: more,
                passes: extra,
            },
        ) => FileOutcome::Pruned {
            removed: removed + more,
            passes: passes + extra,
        },
        (FileOutcome::Pruned { .. }, FileOutcome::Unchanged) => before,
        (FileOutcome::Unchanged, _) => after,
    }
}

/// Removes unused exports from files of a store.
pub struct Pruner<L, S, T> {
    service: L,
    store: S,
    tracker: T,
    options: PruneOptions,
}

impl<L, S, T> Pruner<L, S, T>
where
    L: LanguageService,
    S: FileStore,
    T: EditTracker,
{
    pub fn new(service: L, store: S, tracker: T, options: PruneOptions) -> Self {
        Self {
            service,
            store,
            tracker,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn options(&self) -> &PruneOptions {
        &self.options
    }

    pub fn into_parts(self) -> (L, S, T) {
        (self.service, self.store, self.tracker)
    }

    /// Prune each existing target in order, continuing past failures.
    ///
    /// With `recursive` set, targets are processed again until a round
    /// changes nothing or `max_rounds` is reached: removing an export from a
    /// barrel can leave the export it forwarded without users.
    pub fn run(&mut self, targets: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        let max_rounds = if self.options.recursive {
            self.options.max_rounds.max(1)
        } else {
            1
        };

        for round in 1..=max_rounds {
            summary.rounds = round;
            let mut changed = false;

            for target in targets {
                if !self.store.exists(target) {
                    debug!(file = %target.display(), "skipping missing target");
                    continue;
                }
                match self.prune_file(target) {
                    Ok(outcome) => {
                        changed |= outcome.changed();
                        summary.record(target, outcome);
                    }
                    Err(err) => {
                        warn!(file = %target.display(), "{err}");
                        if !summary.failures.iter().any(|(p, _)| p == target) {
                            summary.failures.push((target.clone(), err.to_string()));
                        }
                    }
                }
            }

            if !changed {
                break;
            }
            debug!(round, "round changed files");
        }

        summary
    }

    /// Prune one file until no unused export remains.
    ///
    /// The edit session is always closed, also on error.
    pub fn prune_file(&mut self, path: &Path) -> PruneResult<FileOutcome> {
        let original = self.store.read(path)?;
        self.tracker.start(path, &original);
        let result = self.prune_loop(path);
        self.tracker.end(path);
        result
    }

    fn prune_loop(&mut self, path: &Path) -> PruneResult<FileOutcome> {
        let mut removed = 0;
        let mut passes = 0;

        loop {
            let module = self.service.parse(&self.store, path)?;
            if module.has_errors() {
                return Err(PruneError::Syntax {
                    path: path.to_path_buf(),
                });
            }

            let scan = scan_exports(&module, &self.options.skip_marker);
            let mut unused: Vec<&Candidate> = Vec::new();
            for candidate in &scan.candidates {
                if classify(&mut self.service, &self.store, path, candidate)?.is_unused() {
                    unused.push(candidate);
                }
            }
            debug!(
                file = %path.display(),
                pass = passes + 1,
                candidates = scan.candidates.len(),
                unused = unused.len(),
                skipped = scan.skipped,
                "scanned exports"
            );

            if unused.is_empty() {
                break;
            }

            let exportless = unused.len() == scan.export_count;
            if exportless && !scan.has_wildcard && self.options.delete_files {
                self.store.delete(path)?;
                self.tracker.deleted(path);
                info!(file = %path.display(), "deleted file with no used exports");
                return Ok(FileOutcome::Deleted);
            }

            let text = module.text();
            let batch = plan_batch(path, text, &unused)?;
            let edited = apply_changes(text, &batch.changes);
            if edited == text {
                return Err(PruneError::NoProgress {
                    path: path.to_path_buf(),
                });
            }

            self.store.write(path, &edited)?;
            passes += 1;
            removed += batch.removals.len();
            for removal in batch.removals {
                self.tracker.removed(path, removal);
            }
        }

        if self.options.cleanup {
            run_cleanup(&mut self.service, &mut self.store, path)?;
        }

        Ok(if removed == 0 {
            FileOutcome::Unchanged
        } else {
            FileOutcome::Pruned { removed, passes }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Project;
    use crate::prune::tracker::{NoopTracker, RecordingTracker};
    use crate::store::MemoryStore;

    fn pruner(
        files: &[(&str, &str)],
        options: PruneOptions,
    ) -> Pruner<Project, MemoryStore, RecordingTracker> {
        let store = MemoryStore::with_files(files.iter().copied());
        Pruner::new(Project::new(), store, RecordingTracker::new(), options)
    }

    fn targets(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_helper_loses_export_shared_stays() {
        let mut pruner = pruner(
            &[
                (
                    "/app/util.ts",
                    "export function helper() {}\nexport function shared() {}\n",
                ),
                ("/app/main.ts", "import { shared } from './util';\nshared();\n"),
            ],
            PruneOptions::default(),
        );

        let summary = pruner.run(&targets(&["/app/util.ts", "/app/main.ts"]));

        assert!(summary.failures.is_empty());
        assert_eq!(summary.removed(), 1);
        assert_eq!(
            pruner.store().get("/app/util.ts"),
            Some("function helper() {}\nexport function shared() {}\n")
        );
        assert_eq!(
            pruner.store().get("/app/main.ts"),
            Some("import { shared } from './util';\nshared();\n")
        );

        let edits: Vec<_> = pruner.tracker().edited().collect();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].removals[0].code, "export ");
        assert_eq!((edits[0].removals[0].line, edits[0].removals[0].column), (1, 1));
    }

    #[test]
    fn test_stabilized_content_is_idempotent() {
        let files = [
            ("/app/a.ts", "export const a = 1;\nexport const b = 2;\n"),
            ("/app/main.ts", "import { a } from './a';\na;\n"),
        ];
        let mut pruner = pruner(&files, PruneOptions::default());
        let all = targets(&["/app/a.ts", "/app/main.ts"]);

        let first = pruner.run(&all);
        assert_eq!(first.removed(), 1);

        let before = pruner.store().revision();
        let second = pruner.run(&all);
        assert_eq!(second.removed(), 0);
        assert!(!second.changed());
        assert_eq!(pruner.store().revision(), before);
    }

    #[test]
    fn test_reexport_chain_unwinds_across_rounds() {
        let files = [
            ("/app/a.ts", "export const x = 1;\nexport const y = 2;\n"),
            ("/app/b.ts", "export { x, y } from './a';\n"),
            ("/app/c.ts", "import { y } from './b';\ny;\n"),
        ];
        let all = targets(&["/app/a.ts", "/app/b.ts", "/app/c.ts"]);

        // single round: a.ts is still re-exported by b.ts when it is scanned
        let mut single = pruner(&files, PruneOptions::default());
        single.run(&all);
        assert_eq!(
            single.store().get("/app/b.ts"),
            Some("export { y } from './a';\n")
        );
        assert_eq!(
            single.store().get("/app/a.ts"),
            Some("export const x = 1;\nexport const y = 2;\n")
        );

        let mut recursive = pruner(
            &files,
            PruneOptions {
                recursive: true,
                ..PruneOptions::default()
            },
        );
        let summary = recursive.run(&all);
        assert_eq!(
            recursive.store().get("/app/a.ts"),
            Some("const x = 1;\nexport const y = 2;\n")
        );
        assert_eq!(summary.rounds, 3);
    }

    #[test]
    fn test_consumer_keeps_barrel_export() {
        let files = [
            ("/app/a.ts", "export const x = 1;\n"),
            ("/app/b.ts", "export { x } from './a';\n"),
            ("/app/c.ts", "import { x } from './b';\nx;\n"),
        ];
        let mut pruner = pruner(&files, PruneOptions::default());
        let summary = pruner.run(&targets(&["/app/a.ts", "/app/b.ts", "/app/c.ts"]));

        assert_eq!(summary.removed(), 0);
        assert_eq!(pruner.store().get("/app/b.ts"), Some("export { x } from './a';\n"));
    }

    #[test]
    fn test_wildcard_file_is_never_deleted() {
        let files = [
            ("/app/a.ts", "export const x = 1;\n"),
            ("/app/index.ts", "export * from './a';\nexport const unused = 1;\n"),
        ];
        let mut pruner = pruner(
            &files,
            PruneOptions {
                delete_files: true,
                ..PruneOptions::default()
            },
        );

        let outcome = pruner.prune_file(Path::new("/app/index.ts")).unwrap();

        assert!(matches!(outcome, FileOutcome::Pruned { removed: 1, .. }));
        assert_eq!(
            pruner.store().get("/app/index.ts"),
            Some("export * from './a';\nconst unused = 1;\n")
        );
    }

    #[test]
    fn test_exportless_file_is_deleted() {
        let files = [
            ("/app/a.ts", "export const x = 1;\nexport function f() {}\n"),
            ("/app/main.ts", "console.log('hi');\n"),
        ];
        let mut pruner = pruner(
            &files,
            PruneOptions {
                delete_files: true,
                ..PruneOptions::default()
            },
        );

        let summary = pruner.run(&targets(&["/app/a.ts", "/app/main.ts"]));

        assert_eq!(summary.deleted(), 1);
        assert!(!pruner.store().exists(Path::new("/app/a.ts")));
        let edits: Vec<_> = pruner.tracker().edited().collect();
        assert!(edits[0].deleted);
        assert!(edits[0].removals.is_empty());
    }

    #[test]
    fn test_file_with_skipped_export_is_kept() {
        let files = [(
            "/app/a.ts",
            "// unexport-skip\nexport const kept = 1;\nexport const dropped = 2;\n",
        )];
        let mut pruner = pruner(
            &files,
            PruneOptions {
                delete_files: true,
                ..PruneOptions::default()
            },
        );

        pruner.prune_file(Path::new("/app/a.ts")).unwrap();

        assert_eq!(
            pruner.store().get("/app/a.ts"),
            Some("// unexport-skip\nexport const kept = 1;\nconst dropped = 2;\n")
        );
    }

    #[test]
    fn test_multi_specifier_batches() {
        let body = "const a = 1, b = 2, c = 3;\n";
        let source = format!("{body}export {{ a, b, c }};\n");
        let consumer = "import { a, c } from './m';\na + c;\n";

        let mut pruner = pruner(
            &[("/app/m.ts", source.as_str()), ("/app/main.ts", consumer)],
            PruneOptions::default(),
        );
        let outcome = pruner.prune_file(Path::new("/app/m.ts")).unwrap();
        assert_eq!(outcome, FileOutcome::Pruned { removed: 1, passes: 1 });
        let expected = format!("{body}export {{ a, c }};\n");
        assert_eq!(pruner.store().get("/app/m.ts"), Some(expected.as_str()));

        // nothing imports from m.ts: the whole statement goes in one pass
        let mut pruner = self::pruner(&[("/app/m.ts", source.as_str())], PruneOptions::default());
        let outcome = pruner.prune_file(Path::new("/app/m.ts")).unwrap();
        assert_eq!(outcome, FileOutcome::Pruned { removed: 1, passes: 1 });
        assert_eq!(pruner.store().get("/app/m.ts"), Some(body));
    }

    #[test]
    fn test_marked_specifier_survives_clause_rewrite() {
        let source = "const c = 1, d = 2;\nexport {\n  // unexport-skip\n  c,\n  d,\n};\n";
        let mut pruner = pruner(&[("/app/m.ts", source)], PruneOptions::default());

        let outcome = pruner.prune_file(Path::new("/app/m.ts")).unwrap();

        assert_eq!(outcome, FileOutcome::Pruned { removed: 1, passes: 1 });
        assert_eq!(
            pruner.store().get("/app/m.ts"),
            Some("const c = 1, d = 2;\nexport {\n  // unexport-skip\n  c,\n};\n")
        );
    }

    #[test]
    fn test_overloaded_function_keeps_its_exports() {
        let source = "export function f(a: string): void;\nexport function f(a: any) {}\nexport const g = 1;\n";
        let mut pruner = pruner(
            &[("/app/o.ts", source)],
            PruneOptions {
                delete_files: true,
                ..PruneOptions::default()
            },
        );

        let outcome = pruner.prune_file(Path::new("/app/o.ts")).unwrap();

        assert_eq!(outcome, FileOutcome::Pruned { removed: 1, passes: 1 });
        assert_eq!(
            pruner.store().get("/app/o.ts"),
            Some("export function f(a: string): void;\nexport function f(a: any) {}\nconst g = 1;\n")
        );
    }

    #[test]
    fn test_two_mixed_clauses_take_two_passes() {
        let files = [
            (
                "/app/m.ts",
                "export { a, b } from './x';\nexport { c, d } from './x';\n",
            ),
            (
                "/app/x.ts",
                "export const a = 1, b = 2, c = 3, d = 4;\n",
            ),
            ("/app/main.ts", "import { a, d } from './m';\na + d;\n"),
        ];
        let mut pruner = pruner(&files, PruneOptions::default());

        let outcome = pruner.prune_file(Path::new("/app/m.ts")).unwrap();

        assert_eq!(outcome, FileOutcome::Pruned { removed: 2, passes: 2 });
        assert_eq!(
            pruner.store().get("/app/m.ts"),
            Some("export { a } from './x';\nexport { d } from './x';\n")
        );
    }

    #[test]
    fn test_cleanup_after_pruning() {
        let files = [
            (
                "/app/util.ts",
                "import { dep } from './dep';\nexport function helper() { return dep; }\nexport function shared() {}\n",
            ),
            ("/app/dep.ts", "export const dep = 1;\n"),
            ("/app/main.ts", "import { shared } from './util';\nshared();\n"),
        ];
        let mut pruner = pruner(
            &files,
            PruneOptions {
                cleanup: true,
                ..PruneOptions::default()
            },
        );

        pruner.prune_file(Path::new("/app/util.ts")).unwrap();

        assert_eq!(
            pruner.store().get("/app/util.ts"),
            Some("export function shared() {}\n")
        );
    }

    #[test]
    fn test_missing_target_is_skipped_and_failures_continue() {
        let files = [
            ("/app/broken.ts", "export const = ;\n"),
            ("/app/a.ts", "export const a = 1;\n"),
        ];
        let mut pruner = pruner(&files, PruneOptions::default());

        let summary = pruner.run(&targets(&["/app/missing.ts", "/app/broken.ts", "/app/a.ts"]));

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, PathBuf::from("/app/broken.ts"));
        assert_eq!(summary.removed(), 1);
        assert_eq!(pruner.store().get("/app/a.ts"), Some("const a = 1;\n"));
        assert!(!pruner.tracker().in_session());
    }

    #[test]
    fn test_noop_tracker_pruner() {
        let store = MemoryStore::with_files([("/app/a.ts", "export type T = string;\n")]);
        let mut pruner = Pruner::new(Project::new(), store, NoopTracker, PruneOptions::default());

        let outcome = pruner.prune_file(Path::new("/app/a.ts")).unwrap();

        assert!(outcome.changed());
        let (_, store, _) = pruner.into_parts();
        assert_eq!(store.get("/app/a.ts"), Some("type T = string;\n"));
    }
}
