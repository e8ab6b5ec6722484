//! Graph construction from the library catalog.
//!
//! # Overview
//!
//! [`GraphBuilder`] materializes the part of the catalog reachable from a set
//! of root libraries. Expansion is breadth-first; every identifier (root or
//! dependency) is resolved through the catalog, so callers may pass
//! identifiers (`foo`), file names (`libfoo.so`) or paths. Node ids are
//! always library **file names**.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A depends on B", mirroring the catalog's
//! per-library dependency sets.
//!
//! ## Strictness
//!
//! A root or reached dependency that the catalog does not know is a hard
//! [`CatalogError::NotFound`]: a partial graph would silently produce a wrong
//! link order.
//!
//! ## Component substitution
//!
//! With [`GraphBuilder::with_components`], every node owned by a component
//! is contracted into a node named after the component (see
//! [`crate::graph::contract`]).

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashSet, VecDeque};

use libshelf_core::{Catalog, CatalogError};
use tracing::{debug, instrument};

use crate::graph::contract::contract;
use crate::graph::depgraph::{DepGraph, GraphError};
use crate::graph::topo::sort;

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Builds a [`DepGraph`] for a set of roots against a [`Catalog`].
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    catalog: &'a Catalog,
    components: bool,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            components: false,
        }
    }

    /// Replace libraries with their owning component after expansion.
    #[must_use]
    pub const fn with_components(mut self, enabled: bool) -> Self {
        self.components = enabled;
        self
    }

    /// Expand `roots` transitively.
    ///
    /// # Errors
    ///
    /// [`GraphError::Catalog`] if a root or a reached dependency is not a
    /// library.
    #[instrument(skip(self, roots))]
    pub fn build<I, S>(&self, roots: I) -> Result<DepGraph, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = DepGraph::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = roots
            .into_iter()
            .map(|r| r.as_ref().to_string())
            .collect();

        while let Some(item) = queue.pop_front() {
            let lib = self
                .catalog
                .get_library(&item)
                .ok_or_else(|| CatalogError::NotFound(item.clone()))?;
            let id = lib.file_name();
            if !visited.insert(id.to_string()) {
                continue;
            }

            graph.ensure_node(id);
            for dep in lib.dependencies() {
                let dep_lib = self
                    .catalog
                    .get_library(dep)
                    .ok_or_else(|| CatalogError::NotFound(dep.clone()))?;
                graph.add_dependency(id, dep_lib.file_name());
                if !visited.contains(dep_lib.file_name()) {
                    queue.push_back(dep_lib.file_name().to_string());
                }
            }
        }

        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "graph built");

        if self.components {
            substitute_components(self.catalog, &mut graph);
        }
        Ok(graph)
    }
}

/// Contract every node owned by a component into the component's node.
///
/// Returns the number of components that appeared in the graph.
pub fn substitute_components(catalog: &Catalog, graph: &mut DepGraph) -> usize {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in graph.keys() {
        if let Some(owner) = catalog.owner_of(id) {
            groups.entry(owner.to_string()).or_default().push(id.to_string());
        }
    }
    for (component, members) in &groups {
        contract(graph, component, members);
    }
    groups.len()
}

/// Every library and every recorded edge of the catalog, without
/// resolution. Dependencies on unknown names become leaf nodes.
#[must_use]
pub fn catalog_graph(catalog: &Catalog) -> DepGraph {
    let mut graph = DepGraph::new();
    for lib in catalog.libraries() {
        graph.ensure_node(lib.file_name());
        for dep in lib.dependencies() {
            graph.add_dependency(lib.file_name(), dep);
        }
    }
    graph
}

/// Topological order of `libs` and everything they depend on.
///
/// With `include_dependencies = false` only the requested libraries are
/// returned, still in dependency order.
///
/// # Errors
///
/// [`GraphError::Catalog`] when a library is unknown.
pub fn sorted_libraries(
    catalog: &Catalog,
    libs: &[String],
    include_dependencies: bool,
) -> Result<Vec<String>, GraphError> {
    let graph = GraphBuilder::new(catalog).build(libs)?;
    let order = sort(&graph);
    if include_dependencies {
        return Ok(order);
    }
    let requested: HashSet<&str> = libs
        .iter()
        .filter_map(|lib| catalog.find_library(lib))
        .collect();
    Ok(order
        .into_iter()
        .filter(|id| requested.contains(id.as_str()))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
