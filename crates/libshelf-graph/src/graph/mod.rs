//! Dependency graph pipeline.
//!
//! # Overview
//!
//! ```text
//! Catalog (per-library dependency sets)
//!        ↓  build::GraphBuilder::build()
//! DepGraph (may contain cycles)
//!        ↓  build::substitute_components()   (optional, contract::contract)
//! DepGraph with component nodes
//!        ↓  prune::prune()                   (optional, acyclic only)
//! transitively-reduced DepGraph
//!        ↓  topo::waves() / export / manifest
//! link order, DOT, JSON, package manifest
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use libshelf_graph::graph::{GraphBuilder, prune, sort};
//!
//! let graph = GraphBuilder::new(&catalog).build(["app"])?;
//! let minimal = prune(&graph)?;
//! println!("{}", sort(&minimal).join(" "));
//! ```

pub mod build;
pub mod contract;
pub mod cycles;
pub mod depgraph;
pub mod export;
pub mod prune;
pub mod topo;

pub use build::{GraphBuilder, catalog_graph, sorted_libraries, substitute_components};
pub use contract::contract;
pub use cycles::{find_all_cycles, would_create_cycle};
pub use depgraph::{DepGraph, GraphError, IndexedGraph, Node};
pub use export::{EdgeExport, GraphExport, NodeExport, to_dot};
pub use prune::prune;
pub use topo::{WAVE_KEY, WaveOrder, annotate_waves, sort, waves};
