//! Project-wide reference index backed by tree-sitter.
//!
//! [`Project`] keeps per-file facts and a [`ModuleGraph`] of the files in a
//! [`FileStore`]. Both are derived state: before every query the project
//! compares the store's revision with the one it last indexed and re-syncs,
//! re-parsing only files whose text changed.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::facts::{ExportOrigin, ImportBinding, Imported, ModuleFacts};
use super::fixes;
use super::resolver;
use super::syntax::{SourceLanguage, SourceModule};
use super::{AnalysisError, AnalysisResult, FixKind, LanguageService, Reference};
use crate::graph::ModuleGraph;
use crate::store::FileStore;

/// Facts for one file plus its resolved module specifiers.
#[derive(Debug)]
struct FileEntry {
    text: String,
    facts: ModuleFacts,
    /// Specifier → project file, for every specifier that resolves.
    resolved: HashMap<String, PathBuf>,
}

/// Where a symbol is ultimately defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Symbol {
    /// A name declared (or imported from outside the project) in `file`.
    Local { file: PathBuf, name: String },
    /// The anonymous default export of `file`.
    Default { file: PathBuf },
    /// An export of `file` whose source cannot be followed further.
    Export { file: PathBuf, name: String },
}

/// Tree-sitter implementation of [`LanguageService`].
#[derive(Debug, Default)]
pub struct Project {
    revision: Option<u64>,
    files: HashMap<PathBuf, FileEntry>,
    graph: ModuleGraph,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed source files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// The module graph as of the last sync.
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Bring the index up to date with `store`.
    ///
    /// A no-op when the store's revision is unchanged since the last sync.
    pub fn sync(&mut self, store: &dyn FileStore) -> AnalysisResult<()> {
        let revision = store.revision();
        if self.revision == Some(revision) {
            return Ok(());
        }

        let paths: Vec<PathBuf> = store
            .files()
            .into_iter()
            .filter(|path| SourceLanguage::from_path(path).is_some())
            .collect();

        let before = self.files.len();
        self.files.retain(|path, _| store.exists(path));
        let mut file_set_changed = self.files.len() != before;

        let mut changed = Vec::new();
        for path in &paths {
            let text = store.read(path)?;
            if self.files.get(path).is_some_and(|entry| entry.text == text) {
                continue;
            }
            file_set_changed |= !self.files.contains_key(path);
            let module = SourceModule::parse(path.clone(), text.clone())?;
            let facts = ModuleFacts::extract(&module);
            self.files.insert(
                path.clone(),
                FileEntry {
                    text,
                    facts,
                    resolved: HashMap::new(),
                },
            );
            changed.push(path.clone());
        }

        // Adding or removing a file can change how any specifier resolves.
        if file_set_changed {
            debug!(files = paths.len(), "rebuilding module graph");
            self.graph = ModuleGraph::new();
            for path in &paths {
                self.index_dependencies(store, path);
            }
            if self.graph.has_cycles() {
                debug!(cycles = self.graph.cycles().len(), "module graph has cycles");
            }
        } else {
            trace!(changed = changed.len(), "updating module graph");
            for path in &changed {
                self.graph.clear_dependencies(path);
                self.index_dependencies(store, path);
            }
        }

        self.revision = Some(revision);
        Ok(())
    }

    fn index_dependencies(&mut self, store: &dyn FileStore, path: &Path) {
        let Some(entry) = self.files.get_mut(path) else {
            return;
        };
        self.graph.add_module(path);
        entry.resolved.clear();
        for (specifier, kind) in entry.facts.dependencies() {
            let Some(target) = resolver::resolve(store, specifier, path) else {
                continue;
            };
            if SourceLanguage::from_path(&target).is_none() {
                continue;
            }
            self.graph.add_edge(path, &target, kind);
            entry.resolved.insert(specifier.to_string(), target);
        }
    }

    fn facts(&self, file: &Path) -> Option<&ModuleFacts> {
        self.files.get(file).map(|entry| &entry.facts)
    }

    fn target(&self, file: &Path, specifier: &str) -> Option<&Path> {
        self.files
            .get(file)
            .and_then(|entry| entry.resolved.get(specifier))
            .map(PathBuf::as_path)
    }

    /// The symbol the occurrence at `position` in `file` stands for.
    fn symbol_at(&self, file: &Path, position: usize) -> AnalysisResult<Symbol> {
        let facts = self
            .facts(file)
            .ok_or_else(|| AnalysisError::FileNotInProject(file.to_path_buf()))?;
        let mut visited = HashSet::new();

        if let Some(export) = facts.exports.iter().find(|e| e.span.contains(position)) {
            let symbol = match &export.origin {
                ExportOrigin::Local(name) => self.local_symbol(file, name, &mut visited),
                ExportOrigin::Default => Symbol::Default {
                    file: file.to_path_buf(),
                },
                ExportOrigin::Reexport { module, imported } => self
                    .target(file, module)
                    .and_then(|target| self.resolve_export(target, imported, &mut visited))
                    .unwrap_or_else(|| Symbol::Export {
                        file: file.to_path_buf(),
                        name: export.exported.clone(),
                    }),
                ExportOrigin::Namespace { .. } => Symbol::Export {
                    file: file.to_path_buf(),
                    name: export.exported.clone(),
                },
            };
            return Ok(symbol);
        }

        if let Some(import) = facts.imports.iter().find(|i| i.span.contains(position)) {
            return Ok(self.import_symbol(file, import, &mut visited));
        }

        match facts.name_at(position) {
            Some(name) => Ok(self.local_symbol(file, name, &mut visited)),
            None => Err(AnalysisError::NoSymbol {
                path: file.display().to_string(),
                position,
            }),
        }
    }

    fn local_symbol(
        &self,
        file: &Path,
        name: &str,
        visited: &mut HashSet<(PathBuf, String)>,
    ) -> Symbol {
        match self.facts(file).and_then(|f| f.import_for_local(name)) {
            Some(import) => self.import_symbol(file, import, visited),
            None => Symbol::Local {
                file: file.to_path_buf(),
                name: name.to_string(),
            },
        }
    }

    fn import_symbol(
        &self,
        file: &Path,
        import: &ImportBinding,
        visited: &mut HashSet<(PathBuf, String)>,
    ) -> Symbol {
        let imported = match &import.imported {
            Imported::Named(name) => Some(name.as_str()),
            Imported::Default => Some("default"),
            Imported::Namespace => None,
        };
        imported
            .zip(self.target(file, &import.module))
            .and_then(|(name, target)| self.resolve_export(target, name, visited))
            .unwrap_or_else(|| Symbol::Local {
                file: file.to_path_buf(),
                name: import.local.clone(),
            })
    }

    /// Follow the export `name` of `file` to its definition.
    ///
    /// `None` when `file` has no such export, directly or through wildcards.
    fn resolve_export(
        &self,
        file: &Path,
        name: &str,
        visited: &mut HashSet<(PathBuf, String)>,
    ) -> Option<Symbol> {
        if !visited.insert((file.to_path_buf(), name.to_string())) {
            return None;
        }
        let facts = self.facts(file)?;

        if let Some(export) = facts.exports.iter().find(|e| e.exported == name) {
            return Some(match &export.origin {
                ExportOrigin::Local(local) => self.local_symbol(file, local, visited),
                ExportOrigin::Default => Symbol::Default {
                    file: file.to_path_buf(),
                },
                ExportOrigin::Reexport { module, imported } => self
                    .target(file, module)
                    .and_then(|target| self.resolve_export(target, imported, visited))
                    .unwrap_or_else(|| Symbol::Export {
                        file: file.to_path_buf(),
                        name: name.to_string(),
                    }),
                ExportOrigin::Namespace { .. } => Symbol::Export {
                    file: file.to_path_buf(),
                    name: name.to_string(),
                },
            });
        }

        if name == "default" {
            return None;
        }
        facts.wildcards.iter().find_map(|module| {
            let target = self.target(file, module)?;
            self.resolve_export(target, name, visited)
        })
    }

    /// Every occurrence of `symbol` across the project.
    fn collect_references(&self, symbol: &Symbol) -> Vec<Reference> {
        let mut refs = BTreeSet::new();
        let mut pending: Vec<(PathBuf, String)> = Vec::new();

        let file = match symbol {
            Symbol::Local { file, .. } | Symbol::Default { file } | Symbol::Export { file, .. } => {
                file
            }
        };
        let Some(facts) = self.facts(file) else {
            return Vec::new();
        };

        if let Symbol::Local { name, .. } = symbol {
            for span in facts.occurrences_of(name) {
                refs.insert(Reference::new(file, *span));
            }
            if let Some(import) = facts.import_for_local(name) {
                refs.insert(Reference::new(file, import.span));
            }
        }

        for export in &facts.exports {
            let matched = match symbol {
                Symbol::Local { name, .. } => {
                    matches!(&export.origin, ExportOrigin::Local(l) if l == name)
                }
                Symbol::Default { .. } => export.origin == ExportOrigin::Default,
                Symbol::Export { name, .. } => export.exported == *name,
            };
            if matched {
                refs.insert(Reference::new(file, export.span));
                pending.push((file.to_path_buf(), export.exported.clone()));
            }
        }

        let mut expanded = HashSet::new();
        while let Some(key) = pending.pop() {
            if expanded.insert(key.clone()) {
                self.expand_export(&key.0, &key.1, &mut refs, &mut pending);
            }
        }

        refs.into_iter().collect()
    }

    /// Record every use of export `name` of `file` in the files importing it.
    fn expand_export(
        &self,
        file: &Path,
        name: &str,
        refs: &mut BTreeSet<Reference>,
        pending: &mut Vec<(PathBuf, String)>,
    ) {
        let mut importers: Vec<&Path> = self
            .graph
            .importers(file)
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        importers.dedup();

        for importer in importers {
            let Some(facts) = self.facts(importer) else {
                continue;
            };
            let from_file = |module: &str| self.target(importer, module) == Some(file);

            for import in facts.imports.iter().filter(|i| from_file(&i.module)) {
                let binds = match &import.imported {
                    Imported::Named(imported) => imported == name,
                    Imported::Default => name == "default",
                    Imported::Namespace => {
                        self.expand_namespace(importer, import, name, refs);
                        false
                    }
                };
                if !binds {
                    continue;
                }
                refs.insert(Reference::new(importer, import.span));
                for span in facts.occurrences_of(&import.local) {
                    refs.insert(Reference::new(importer, *span));
                }
                for export in &facts.exports {
                    if matches!(&export.origin, ExportOrigin::Local(l) if *l == import.local) {
                        refs.insert(Reference::new(importer, export.span));
                        pending.push((importer.to_path_buf(), export.exported.clone()));
                    }
                }
            }

            for export in &facts.exports {
                match &export.origin {
                    ExportOrigin::Reexport { module, imported }
                        if imported == name && from_file(module) =>
                    {
                        refs.insert(Reference::new(importer, export.span));
                        pending.push((importer.to_path_buf(), export.exported.clone()));
                    }
                    // `export * as ns` hides which members are used; count it.
                    ExportOrigin::Namespace { module } if from_file(module) => {
                        refs.insert(Reference::new(importer, export.span));
                    }
                    _ => {}
                }
            }

            for (module, span) in &facts.dynamic_imports {
                if from_file(module) {
                    refs.insert(Reference::new(importer, *span));
                }
            }

            if name != "default"
                && !facts.exports_name(name)
                && facts.wildcards.iter().any(|module| from_file(module))
            {
                pending.push((importer.to_path_buf(), name.to_string()));
            }
        }
    }

    /// Uses of `name` through the namespace import `import`.
    ///
    /// A namespace object used other than as `ns.member` escapes analysis, in
    /// which case the import itself counts as a reference.
    fn expand_namespace(
        &self,
        importer: &Path,
        import: &ImportBinding,
        name: &str,
        refs: &mut BTreeSet<Reference>,
    ) {
        let Some(facts) = self.facts(importer) else {
            return;
        };
        let accesses: Vec<_> = facts
            .members
            .iter()
            .filter(|access| access.object == import.local)
            .collect();
        let uses = facts.occurrences_of(&import.local).len();
        let reexported = facts
            .exports
            .iter()
            .any(|e| matches!(&e.origin, ExportOrigin::Local(l) if *l == import.local));

        if uses > accesses.len() || reexported {
            refs.insert(Reference::new(importer, import.span));
        }
        for access in accesses.iter().filter(|access| access.property == name) {
            refs.insert(Reference::new(importer, access.span));
        }
    }
}

impl LanguageService for Project {
    fn find_references(
        &mut self,
        store: &dyn FileStore,
        file: &Path,
        position: usize,
    ) -> AnalysisResult<Vec<Reference>> {
        self.sync(store)?;
        let symbol = self.symbol_at(file, position)?;
        trace!(?symbol, file = %file.display(), position, "finding references");
        Ok(self.collect_references(&symbol))
    }

    fn resolve_module(
        &mut self,
        store: &dyn FileStore,
        specifier: &str,
        from: &Path,
    ) -> Option<PathBuf> {
        if self.revision == Some(store.revision()) {
            if let Some(target) = self.target(from, specifier) {
                return Some(target.to_path_buf());
            }
        }
        resolver::resolve(store, specifier, from)
    }

    fn apply_fix(
        &mut self,
        store: &dyn FileStore,
        fix: FixKind,
        file: &Path,
    ) -> AnalysisResult<String> {
        let module = self.parse(store, file)?;
        Ok(match fix {
            FixKind::UnusedDeclarations => fixes::remove_unused_declarations(&module),
            FixKind::UnusedImports => fixes::remove_unused_imports(&module),
        })
    }
}
