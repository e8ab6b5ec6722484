//! `libshelf graph` — print the dependency graph of a set of libraries.
//!
//! Pretty and text modes emit Graphviz DOT (component nodes drawn as
//! boxes); JSON mode emits the node and edge enumeration.

use std::collections::BTreeSet;
use std::io::Write;

use clap::Args;
use libshelf_graph::graph::{GraphBuilder, GraphExport, prune, to_dot};

use crate::cmd::Session;
use crate::output::render;

/// Arguments for `libshelf graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Root libraries.
    #[arg(required = true, value_name = "LIB")]
    pub libs: Vec<String>,

    /// Replace libraries with the component that owns them.
    #[arg(long)]
    pub show_components: bool,

    /// Remove edges implied by longer paths.
    #[arg(long)]
    pub minimize: bool,
}

pub fn run_graph(args: &GraphArgs, session: &Session) -> anyhow::Result<()> {
    let mut graph = GraphBuilder::new(&session.catalog)
        .with_components(args.show_components)
        .build(&args.libs)?;
    if args.minimize {
        graph = prune(&graph)?;
    }

    if session.output.is_json() {
        return render(session.output, &GraphExport::from_graph(&graph), |_, _| Ok(()));
    }

    let components: BTreeSet<String> = graph
        .keys()
        .filter(|id| session.catalog.is_component(id))
        .map(str::to_string)
        .collect();
    let dot = to_dot(&graph, &components);
    render(session.output, &dot, |d, w| write!(w, "{d}"))
}
