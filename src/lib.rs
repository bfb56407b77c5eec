//! # ALIASLENS
//!
//! Public API surface extraction for Go module trees.
//!
//! ALIASLENS indexes every package of a Go module, builds a model of each
//! package's exported types, and resolves type aliases that re-export a type
//! from another package or another module. The aliased definition is hoisted
//! into the aliasing package so reviewers see the real shape of the type.
//!
//! ## Pipeline
//!
//! 1. Read the module path from `go.mod`
//! 2. Walk the module tree and parse one declaration index per package
//! 3. Index every package
//! 4. Resolve aliases, indexing packages of sibling modules on demand
//!
//! Every resolved alias carries a diagnostic: `info` when the origin lives in
//! the same module, `warning` when it crosses a module boundary.

pub mod core;
pub mod formatters;
pub mod parsers;
