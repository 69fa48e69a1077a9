//! unexport - remove exports nothing uses from JavaScript/TypeScript projects
//!
//! This crate finds exported declarations and export specifiers that no other
//! file of the project references, and removes the `export` from them (or the
//! whole re-export), repeating until the project reaches a fixed point.

pub mod analysis;
pub mod config;
pub mod graph;
pub mod prune;
pub mod report;
pub mod store;
