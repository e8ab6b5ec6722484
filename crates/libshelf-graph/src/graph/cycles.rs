//! Cycle detection helpers for dependency graphs.
//!
//! # Edge Direction
//!
//! The graph uses edge direction `dependent → dependency`.
//! Adding a new edge `from → to` would create a cycle if `from` is already
//! reachable from `to` through existing edges.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;

use crate::graph::depgraph::DepGraph;

/// Check whether adding `from -> to` would introduce a dependency cycle.
///
/// Returns the cycle path when one would be created, formatted as
/// `from -> to -> ... -> from`.
///
/// If the edge already exists, this returns `None` (no *new* cycle is created).
#[must_use]
pub fn would_create_cycle(graph: &DepGraph, from: &str, to: &str) -> Option<Vec<String>> {
    if from == to {
        return Some(vec![from.to_string(), to.to_string()]);
    }

    if graph.successors(from).any(|s| s == to) {
        return None;
    }

    // BFS from `to` looking for `from`.
    let mut queue: VecDeque<&str> = VecDeque::from([to]);
    let mut visited: HashSet<&str> = HashSet::from([to]);
    let mut parent: HashMap<&str, &str> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if current == from {
            return Some(reconstruct_cycle_path(from, to, &parent));
        }
        for next in graph.successors(current) {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Find all cycles currently present in `graph`.
///
/// Each entry is a sorted list of node ids in one strongly connected
/// component (SCC) with more than one member. Entries are sorted.
#[must_use]
pub fn find_all_cycles(graph: &DepGraph) -> Vec<Vec<String>> {
    let indexed = graph.to_petgraph();
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&indexed.graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .filter_map(|idx| indexed.graph.node_weight(idx).cloned())
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

fn reconstruct_cycle_path(from: &str, to: &str, parent: &HashMap<&str, &str>) -> Vec<String> {
    // Parent links represent a path: to -> ... -> from.
    let mut to_to_from: Vec<&str> = vec![from];
    let mut cursor = from;

    while cursor != to {
        if let Some(next) = parent.get(cursor) {
            cursor = *next;
            to_to_from.push(cursor);
        } else {
            break;
        }
    }

    to_to_from.reverse();

    let mut cycle: Vec<String> = Vec::with_capacity(to_to_from.len() + 1);
    cycle.push(from.to_string());
    cycle.extend(to_to_from.into_iter().map(str::to_string));
    cycle
}
