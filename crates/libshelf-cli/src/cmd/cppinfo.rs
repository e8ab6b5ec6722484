//! `libshelf cppinfo` — Conan `package_info` for libraries, packages or
//! components.

use std::io::Write;

use clap::Args;
use libshelf_graph::graph::{GraphBuilder, prune};
use libshelf_graph::manifest::{build_manifest, render_conan};

use crate::cmd::Session;
use crate::output::render;

/// Arguments for `libshelf cppinfo`.
#[derive(Args, Debug)]
pub struct CppinfoArgs {
    /// Libraries, package names or component names.
    #[arg(required = true, value_name = "ITEM")]
    pub items: Vec<String>,

    /// Only require what is not already required transitively.
    #[arg(long)]
    pub minimize: bool,

    /// Indent with N spaces instead of a tab.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub indent: usize,
}

pub fn run_cppinfo(args: &CppinfoArgs, session: &Session) -> anyhow::Result<()> {
    let roots = session.catalog.expand_items(&args.items);
    let mut graph = GraphBuilder::new(&session.catalog)
        .with_components(true)
        .build(&roots)?;
    if args.minimize {
        graph = prune(&graph)?;
    }

    let entries = build_manifest(&session.catalog, &graph);
    let indent = if args.indent > 0 {
        " ".repeat(args.indent)
    } else {
        "\t".to_string()
    };
    render(session.output, &entries, |e, w| {
        write!(w, "{}", render_conan(e, &indent))
    })
}
