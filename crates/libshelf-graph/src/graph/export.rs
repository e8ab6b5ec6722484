//! Graph rendering: Graphviz DOT and a serializable node/edge listing.

use std::collections::BTreeSet;

use petgraph::dot::{Config, Dot};
use serde::Serialize;

use crate::graph::depgraph::DepGraph;
use crate::graph::topo::{WAVE_KEY, annotate_waves};

/// Render `graph` as Graphviz DOT. Nodes listed in `highlighted` (typically
/// component nodes) are drawn as boxes.
#[must_use]
pub fn to_dot(graph: &DepGraph, highlighted: &BTreeSet<String>) -> String {
    let indexed = graph.to_petgraph();
    let labelled = indexed.graph.map(|_, id| id.as_str(), |_, ()| "");
    format!(
        "{}",
        Dot::with_attr_getters(
            &labelled,
            &[Config::EdgeNoLabel],
            &|_, _| String::new(),
            &|_, (_, id)| {
                if highlighted.contains(*id) {
                    "shape = box".to_string()
                } else {
                    String::new()
                }
            },
        )
    )
}

/// One node of a [`GraphExport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeExport {
    pub id: String,
    /// Wave index from the topological sort; absent for cyclic nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave: Option<usize>,
    pub root: bool,
}

/// One edge of a [`GraphExport`]: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeExport {
    pub from: String,
    pub to: String,
}

/// Full node and edge enumeration, ready for JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

impl GraphExport {
    /// Enumerate `graph`, annotating a scratch copy with wave indices.
    #[must_use]
    pub fn from_graph(graph: &DepGraph) -> Self {
        let mut annotated = graph.clone();
        annotate_waves(&mut annotated);

        let nodes = annotated
            .nodes()
            .map(|node| NodeExport {
                id: node.id().to_string(),
                wave: node.annotation(WAVE_KEY).and_then(|w| w.parse().ok()),
                root: node.is_root(),
            })
            .collect();
        let edges = annotated
            .edges()
            .map(|(from, to)| EdgeExport {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect();
        Self { nodes, edges }
    }
}
