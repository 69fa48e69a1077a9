//! Graph module for module dependency modeling.
//!
//! This module provides the [`ModuleGraph`] struct recording which project
//! files import or re-export from which, so that the reference search can
//! find every importer of a module.
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use unexport::graph::{EdgeKind, ModuleGraph};
//!
//! let mut graph = ModuleGraph::new();
//! graph.add_edge(Path::new("/app/index.ts"), Path::new("/app/a.ts"), EdgeKind::Wildcard);
//! graph.add_edge(Path::new("/app/main.ts"), Path::new("/app/index.ts"), EdgeKind::Import);
//!
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edge_count(), 2);
//! ```

mod module_graph;

pub use module_graph::{EdgeKind, ModuleGraph};
