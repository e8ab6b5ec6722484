//! Directed dependency graph over opaque string identifiers.
//!
//! # Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must appear after A on a
//! link line. Roots (in-degree 0) are the libraries nothing else needs.
//!
//! # Storage
//!
//! Nodes live in an arena keyed by identifier; each node keeps its incoming
//! and outgoing neighbours as identifier sets. Every edge is mirrored on both
//! endpoints, so `A ∈ B.in ⇔ B ∈ A.out` always holds. Ordered containers make
//! every enumeration deterministic.
//!
//! Algorithms that are easier to express over an index-based graph (SCC
//! detection, DOT rendering) go through [`DepGraph::to_petgraph`].

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt::Write as _;

use libshelf_core::{CatalogError, ErrorCode};
use petgraph::graph::{DiGraph, NodeIndex};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by graph construction and graph algorithms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Removing an edge that is not in the graph.
    #[error("no dependency edge {src} -> {tgt}")]
    InvalidEdge { src: String, tgt: String },

    /// The algorithm requires an acyclic graph. Each entry is one strongly
    /// connected component (sorted).
    #[error("dependency cycle detected: {}", format_cycles(.0))]
    Cyclic(Vec<Vec<String>>),

    /// A root or reached dependency is not in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl GraphError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidEdge { .. } => ErrorCode::InvalidEdge,
            Self::Cyclic(_) => ErrorCode::CycleDetected,
            Self::Catalog(err) => err.error_code(),
        }
    }
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    let mut out = String::new();
    for (i, cycle) in cycles.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "[{}]", cycle.join(", "));
    }
    out
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One graph node: identifier, neighbour sets and a scratch annotation map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    id: String,
    in_refs: BTreeSet<String>,
    out_refs: BTreeSet<String>,
    annotations: BTreeMap<String, String>,
}

impl Node {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Nodes with an edge into this one (its dependents).
    #[must_use]
    pub const fn predecessors(&self) -> &BTreeSet<String> {
        &self.in_refs
    }

    /// Nodes this one has an edge to (its dependencies).
    #[must_use]
    pub const fn successors(&self) -> &BTreeSet<String> {
        &self.out_refs
    }

    #[must_use]
    pub fn in_degree(&self) -> usize {
        self.in_refs.len()
    }

    #[must_use]
    pub fn out_degree(&self) -> usize {
        self.out_refs.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.in_refs.is_empty()
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }
}

// ---------------------------------------------------------------------------
// DepGraph
// ---------------------------------------------------------------------------

/// Identifier-keyed directed graph with mirrored in/out edge sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepGraph {
    nodes: BTreeMap<String, Node>,
}

/// Index-based projection of a [`DepGraph`].
#[derive(Debug)]
pub struct IndexedGraph {
    /// Nodes weighted by identifier, one edge per dependency.
    pub graph: DiGraph<String, ()>,
    /// Identifier → petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
}

impl DepGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an edge list. Convenience for tests and callers
    /// that already hold plain pairs.
    #[must_use]
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut graph = Self::new();
        for (src, tgt) in edges {
            graph.add_dependency(src, tgt);
        }
        graph
    }

    /// Return the node for `id`, creating an isolated one if needed.
    pub fn ensure_node(&mut self, id: &str) -> &mut Node {
        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| Node::new(id))
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Add the edge `src → tgt`, creating missing endpoints.
    ///
    /// Self-edges are ignored. Returns `true` when the edge is new.
    pub fn add_dependency(&mut self, src: &str, tgt: &str) -> bool {
        if src == tgt {
            self.ensure_node(src);
            return false;
        }
        let added = self.ensure_node(src).out_refs.insert(tgt.to_string());
        self.ensure_node(tgt).in_refs.insert(src.to_string());
        added
    }

    /// Remove the edge `src → tgt`.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidEdge`] if the edge does not exist.
    pub fn remove_dependency(&mut self, src: &str, tgt: &str) -> Result<(), GraphError> {
        let invalid = || GraphError::InvalidEdge {
            src: src.to_string(),
            tgt: tgt.to_string(),
        };
        let removed = self
            .nodes
            .get_mut(src)
            .is_some_and(|node| node.out_refs.remove(tgt));
        if !removed {
            return Err(invalid());
        }
        if !self
            .nodes
            .get_mut(tgt)
            .is_some_and(|node| node.in_refs.remove(src))
        {
            return Err(invalid());
        }
        Ok(())
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        for pred in &node.in_refs {
            if let Some(p) = self.nodes.get_mut(pred) {
                p.out_refs.remove(id);
            }
        }
        for succ in &node.out_refs {
            if let Some(s) = self.nodes.get_mut(succ) {
                s.in_refs.remove(id);
            }
        }
        Some(node)
    }

    /// `true` when `id` is in the graph and nothing depends on it.
    #[must_use]
    pub fn is_root(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(Node::is_root)
    }

    /// Root identifiers in lexicographic order.
    #[must_use]
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.is_root())
            .map(Node::id)
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Every edge as `(src, tgt)`, ordered by source then target.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.values().flat_map(|node| {
            node.out_refs
                .iter()
                .map(move |tgt| (node.id.as_str(), tgt.as_str()))
        })
    }

    pub fn successors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.out_refs.iter().map(String::as_str))
    }

    pub fn predecessors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.in_refs.iter().map(String::as_str))
    }

    /// Every node reachable from `id` through at least one edge.
    #[must_use]
    pub fn reachable_from(&self, id: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&str> = self.successors(id).collect();
        while let Some(current) = queue.pop_front() {
            if seen.insert(current.to_string()) {
                queue.extend(self.successors(current));
            }
        }
        seen
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(Node::out_degree).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store `value` under `key` on node `id`. Returns `false` if the node
    /// does not exist.
    pub fn annotate(&mut self, id: &str, key: &str, value: impl Into<String>) -> bool {
        self.nodes.get_mut(id).is_some_and(|node| {
            node.annotations.insert(key.to_string(), value.into());
            true
        })
    }

    #[must_use]
    pub fn annotation(&self, id: &str, key: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.annotation(key))
    }

    /// Project onto a petgraph `DiGraph`. Node indices follow identifier
    /// order.
    #[must_use]
    pub fn to_petgraph(&self) -> IndexedGraph {
        let mut graph = DiGraph::<String, ()>::with_capacity(self.node_count(), self.edge_count());
        let mut node_map = HashMap::with_capacity(self.node_count());
        for id in self.nodes.keys() {
            node_map.insert(id.clone(), graph.add_node(id.clone()));
        }
        for (src, tgt) in self.edges() {
            if let (Some(&a), Some(&b)) = (node_map.get(src), node_map.get(tgt)) {
                graph.add_edge(a, b, ());
            }
        }
        IndexedGraph { graph, node_map }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
