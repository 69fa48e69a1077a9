//! Module dependency graph implementation using petgraph.
//!
//! Nodes are project files, edges point from the depending file to the file
//! it imports or re-exports from. The reference search walks edges backwards
//! (importers of a module) to expand an exported symbol to its users.

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How one module depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// `import ... from 'm'`, including side-effect imports
    Import,
    /// `export { x } from 'm'` or `export * as ns from 'm'`
    Reexport,
    /// `export * from 'm'`
    Wildcard,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Reexport => write!(f, "re-export"),
            Self::Wildcard => write!(f, "wildcard"),
        }
    }
}

/// Directed graph of project modules.
#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    graph: DiGraph<PathBuf, EdgeKind>,
    node_indices: HashMap<PathBuf, NodeIndex>,
}

impl ModuleGraph {
    /// Creates a new empty module graph.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unexport::graph::ModuleGraph;
    ///
    /// let graph = ModuleGraph::new();
    /// assert_eq!(graph.node_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module to the graph.
    ///
    /// If the module is already present, returns its existing node index.
    pub fn add_module(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_path_buf());
        self.node_indices.insert(path.to_path_buf(), idx);
        idx
    }

    /// Adds a dependency edge, creating missing nodes.
    ///
    /// Parallel edges of the same kind are collapsed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::path::Path;
    /// use unexport::graph::{EdgeKind, ModuleGraph};
    ///
    /// let mut graph = ModuleGraph::new();
    /// graph.add_edge(Path::new("/app/main.ts"), Path::new("/app/util.ts"), EdgeKind::Import);
    ///
    /// let importers = graph.importers(Path::new("/app/util.ts"));
    /// assert_eq!(importers.len(), 1);
    /// assert_eq!(importers[0].0, Path::new("/app/main.ts"));
    /// ```
    pub fn add_edge(&mut self, from: &Path, to: &Path, kind: EdgeKind) {
        let from_idx = self.add_module(from);
        let to_idx = self.add_module(to);

        let exists = self
            .graph
            .edges_connecting(from_idx, to_idx)
            .any(|edge| *edge.weight() == kind);
        if !exists {
            self.graph.add_edge(from_idx, to_idx, kind);
        }
    }

    /// Modules depending on `path` (incoming edges), sorted by path.
    pub fn importers(&self, path: &Path) -> Vec<(&Path, EdgeKind)> {
        self.neighbors(path, Direction::Incoming)
    }

    /// Modules `path` depends on (outgoing edges), sorted by path.
    pub fn dependencies(&self, path: &Path) -> Vec<(&Path, EdgeKind)> {
        self.neighbors(path, Direction::Outgoing)
    }

    fn neighbors(&self, path: &Path, direction: Direction) -> Vec<(&Path, EdgeKind)> {
        let Some(&idx) = self.node_indices.get(path) else {
            return Vec::new();
        };

        let mut found: Vec<(&Path, EdgeKind)> = self
            .graph
            .edges_directed(idx, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                self.graph
                    .node_weight(other)
                    .map(|p| (p.as_path(), *edge.weight()))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(b.0));
        found
    }

    /// Removes every edge leaving `path`; the node itself stays.
    ///
    /// Used when a file's imports are re-extracted after an edit.
    pub fn clear_dependencies(&mut self, path: &Path) {
        let Some(&idx) = self.node_indices.get(path) else {
            return;
        };
        let mut outgoing: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        // removal swaps the last edge into the freed slot, so go from the back
        outgoing.sort_unstable_by(|a, b| b.cmp(a));
        for edge in outgoing {
            self.graph.remove_edge(edge);
        }
    }

    /// Checks if any import or re-export cycle exists.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Groups of modules that (transitively) depend on each other.
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut paths: Vec<PathBuf> = scc
                    .iter()
                    .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                    .collect();
                paths.sort();
                paths
            })
            .collect()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.node_indices.contains_key(path)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
