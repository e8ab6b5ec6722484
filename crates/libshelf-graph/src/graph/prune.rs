//! Transitive reduction ("arc pruning") of an acyclic dependency graph.
//!
//! # Overview
//!
//! An edge `A → C` is redundant if there is already a path `A → B → … → C`.
//! Removing every redundant edge gives the minimal graph with the same
//! reachability, which is what a minimized requirement list should declare.
//!
//! # Algorithm
//!
//! 1. Reject cyclic input (the reduction of a cyclic graph is not unique).
//! 2. Walk the nodes in wave order, so every parent is visited before its
//!    children, and memoize each node's ancestor set.
//! 3. For every node with more than one parent, a direct edge from parent
//!    `q` is redundant when `q` is also an ancestor of another parent `p`.
//! 4. Apply all scheduled removals at once on a copy of the graph.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument};

use crate::graph::cycles::find_all_cycles;
use crate::graph::depgraph::{DepGraph, GraphError};
use crate::graph::topo::waves;

/// Return a transitively-reduced copy of `graph`.
///
/// # Errors
///
/// [`GraphError::Cyclic`] when `graph` contains a cycle.
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn prune(graph: &DepGraph) -> Result<DepGraph, GraphError> {
    let cycles = find_all_cycles(graph);
    if !cycles.is_empty() {
        return Err(GraphError::Cyclic(cycles));
    }

    let order = waves(graph).order();
    let mut ancestors: HashMap<&str, BTreeSet<&str>> = HashMap::with_capacity(order.len());
    let mut removals: BTreeSet<(String, String)> = BTreeSet::new();

    for id in &order {
        let Some(node) = graph.node(id) else {
            continue;
        };

        let mut own = BTreeSet::new();
        for parent in node.predecessors() {
            own.insert(parent.as_str());
            if let Some(up) = ancestors.get(parent.as_str()) {
                own.extend(up.iter().copied());
            }
        }

        if node.in_degree() > 1 {
            for p in node.predecessors() {
                let Some(above_p) = ancestors.get(p.as_str()) else {
                    continue;
                };
                for q in node.predecessors() {
                    if q != p && above_p.contains(q.as_str()) {
                        removals.insert((q.clone(), id.clone()));
                    }
                }
            }
        }

        ancestors.insert(id.as_str(), own);
    }

    let mut pruned = graph.clone();
    for (src, tgt) in &removals {
        debug!(src = %src, tgt = %tgt, "removing transitive edge");
        pruned.remove_dependency(src, tgt)?;
    }
    Ok(pruned)
}
