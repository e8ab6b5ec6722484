//! Deterministic wave-ordered topological sort.
//!
//! # Algorithm
//!
//! Kahn's algorithm processed level by level:
//!
//! 1. Wave 0 holds every root (in-degree 0), sorted lexicographically.
//! 2. Emitting a wave decrements the effective in-degree of each successor;
//!    successors that reach zero form the next wave, again sorted.
//! 3. Repeat until a wave is empty.
//!
//! Because edges point from dependent to dependency, the resulting order
//! lists every library before the libraries it needs, which is the order a
//! static link line expects.
//!
//! Nodes on a cycle never reach in-degree zero, so they (and everything
//! reachable only through them) are left out of the order and reported in
//! [`WaveOrder::omitted`].

use std::collections::BTreeMap;

use tracing::{instrument, warn};

use crate::graph::depgraph::DepGraph;

/// Annotation key under which [`annotate_waves`] stores the wave index.
pub const WAVE_KEY: &str = "wave";

/// Level sets produced by the sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveOrder {
    /// Sorted node ids per wave.
    pub waves: Vec<Vec<String>>,
    /// Nodes that could not be ordered because of cycles (sorted).
    pub omitted: Vec<String>,
}

impl WaveOrder {
    /// Flattened order: wave 0 first.
    #[must_use]
    pub fn order(&self) -> Vec<String> {
        self.waves.iter().flatten().cloned().collect()
    }
}

/// Compute the wave decomposition of `graph`.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn waves(graph: &DepGraph) -> WaveOrder {
    let mut in_degree: BTreeMap<&str, usize> = graph
        .nodes()
        .map(|node| (node.id(), node.in_degree()))
        .collect();

    let mut waves = Vec::new();
    let mut current: Vec<&str> = graph.roots();
    while !current.is_empty() {
        let mut next = Vec::new();
        for id in &current {
            in_degree.remove(id);
            for succ in graph.successors(id) {
                if let Some(deg) = in_degree.get_mut(succ) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        next.push(succ);
                    }
                }
            }
        }
        next.sort_unstable();
        next.dedup();
        waves.push(current.into_iter().map(str::to_string).collect());
        current = next;
    }

    let omitted: Vec<String> = in_degree.into_keys().map(str::to_string).collect();
    if !omitted.is_empty() {
        warn!(omitted = omitted.len(), "cyclic nodes left out of the order");
    }
    WaveOrder { waves, omitted }
}

/// Topologically sorted node ids. Cyclic nodes are left out.
#[must_use]
pub fn sort(graph: &DepGraph) -> Vec<String> {
    waves(graph).order()
}

/// Store each node's wave index under [`WAVE_KEY`] and return the waves.
pub fn annotate_waves(graph: &mut DepGraph) -> WaveOrder {
    let order = waves(graph);
    for (index, wave) in order.waves.iter().enumerate() {
        for id in wave {
            graph.annotate(id, WAVE_KEY, index.to_string());
        }
    }
    order
}
