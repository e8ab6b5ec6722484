//! `libshelf find` — which library defines a symbol.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use crate::cmd::{NameArgs, Session};
use crate::output::render;

/// Arguments for `libshelf find`.
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Symbol to look up (demangled form when demangling is enabled).
    pub symbol: String,

    #[command(flatten)]
    pub names: NameArgs,
}

#[derive(Debug, Serialize)]
struct FindOutput {
    symbol: String,
    library: String,
}

pub fn run_find(args: &FindArgs, session: &Session) -> anyhow::Result<()> {
    let Some(definer) = session.catalog.definer_of(&args.symbol) else {
        anyhow::bail!("symbol '{}' not found", args.symbol);
    };

    let result = FindOutput {
        symbol: args.symbol.clone(),
        library: session.name_format(&args.names).format(definer),
    };
    render(session.output, &result, |r, w| {
        writeln!(w, "Symbol '{}' found in library {}", r.symbol, r.library)
    })
}
