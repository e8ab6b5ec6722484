//! Component contraction: merge a set of member nodes into one node.
//!
//! Edges from outside the group into a member are redirected to the
//! component node, edges from a member to the outside leave from the
//! component node, and edges between members disappear. The member nodes are
//! deleted. Self-loops never appear because [`DepGraph::add_dependency`]
//! ignores them.

use std::collections::BTreeSet;

use tracing::debug;

use crate::graph::depgraph::DepGraph;

/// Merge the `members` present in `graph` into a node called `name`.
///
/// Members absent from the graph are ignored; if none is present the graph
/// is left untouched. Returns the number of nodes merged.
pub fn contract<I, S>(graph: &mut DepGraph, name: &str, members: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let present: BTreeSet<String> = members
        .into_iter()
        .map(|m| m.as_ref().to_string())
        .filter(|m| m != name && graph.contains(m))
        .collect();
    if present.is_empty() {
        return 0;
    }

    graph.ensure_node(name);
    for member in &present {
        let Some(node) = graph.remove_node(member) else {
            continue;
        };
        for pred in node.predecessors() {
            if !present.contains(pred) {
                graph.add_dependency(pred, name);
            }
        }
        for succ in node.successors() {
            if !present.contains(succ) {
                graph.add_dependency(name, succ);
            }
        }
    }

    debug!(component = name, merged = present.len(), "component contracted");
    present.len()
}
