#![forbid(unsafe_code)]
//! libshelf-graph: dependency graphs built from a library catalog.
//!
//! # Conventions
//!
//! - **Errors**: algorithms return [`graph::GraphError`], which maps onto the
//!   shared [`libshelf_core::ErrorCode`] table.
//! - **Logging**: `tracing` macros; graph sizes are recorded as span fields.

pub mod graph;
pub mod manifest;

pub use graph::{DepGraph, GraphBuilder, GraphError};
pub use manifest::{ManifestEntry, build_manifest, render_conan};
