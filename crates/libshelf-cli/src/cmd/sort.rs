//! `libshelf sort` — print libraries in link order.

use std::io::Write;

use clap::Args;
use libshelf_graph::graph::sorted_libraries;
use serde::Serialize;

use crate::cmd::{NameArgs, Session, unescape};
use crate::output::render_mode;

/// Arguments for `libshelf sort`.
#[derive(Args, Debug)]
pub struct SortArgs {
    /// Libraries to order (identifiers, file names or paths).
    #[arg(required = true, value_name = "LIB")]
    pub libs: Vec<String>,

    /// List separator; `\n` and `\t` are expanded.
    #[arg(long, value_name = "SEP")]
    pub sep: Option<String>,

    /// Order only the given libraries, without their dependencies.
    #[arg(long)]
    pub no_deps: bool,

    #[command(flatten)]
    pub names: NameArgs,
}

#[derive(Debug, Serialize)]
struct SortOutput {
    libraries: Vec<String>,
}

pub fn run_sort(args: &SortArgs, session: &Session) -> anyhow::Result<()> {
    let known = session.known_libraries(&args.libs);
    let order = sorted_libraries(&session.catalog, &known, !args.no_deps)?;

    let format = session.name_format(&args.names);
    let separator = unescape(
        args.sep
            .as_deref()
            .unwrap_or(&session.config.project.output.separator),
    );
    let result = SortOutput {
        libraries: format.format_all(&order),
    };

    render_mode(
        session.output,
        &result,
        |r, w| writeln!(w, "{}", r.libraries.join(separator.as_str())),
        |r, w| {
            writeln!(w, "Libraries sorted according to dependencies:")?;
            writeln!(w, "{}", r.libraries.join(separator.as_str()))
        },
    )
}
