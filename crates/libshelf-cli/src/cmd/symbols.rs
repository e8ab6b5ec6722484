//! `libshelf symbols` — list resolved or pending symbols.

use std::io::Write;

use clap::Args;
use libshelf_core::CatalogError;
use serde::Serialize;

use crate::cmd::{NameArgs, Session};
use crate::output::render_mode;

/// Arguments for `libshelf symbols`.
#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// List undefined references still waiting for a definer.
    #[arg(long)]
    pub undefined: bool,

    /// Only list the symbols this library defines.
    #[arg(long, value_name = "LIB", conflicts_with = "undefined")]
    pub library: Option<String>,

    #[command(flatten)]
    pub names: NameArgs,
}

#[derive(Debug, Serialize)]
struct SymbolEntry {
    symbol: String,
    libraries: Vec<String>,
}

pub fn run_symbols(args: &SymbolsArgs, session: &Session) -> anyhow::Result<()> {
    let format = session.name_format(&args.names);
    let index = session.catalog.symbols();
    let entries: Vec<SymbolEntry> = if let Some(name) = &args.library {
        let file = session
            .catalog
            .find_library(name)
            .ok_or_else(|| CatalogError::NotFound(name.clone()))?;
        index
            .symbols_defined_by(file)
            .map(|symbol| SymbolEntry {
                symbol: symbol.to_string(),
                libraries: vec![format.format(file)],
            })
            .collect()
    } else if args.undefined {
        index
            .undefined_table()
            .iter()
            .map(|(symbol, waiting)| SymbolEntry {
                symbol: symbol.clone(),
                libraries: format.format_all(waiting),
            })
            .collect()
    } else {
        index
            .defined_table()
            .iter()
            .map(|(symbol, definer)| SymbolEntry {
                symbol: symbol.clone(),
                libraries: vec![format.format(definer)],
            })
            .collect()
    };

    render_mode(
        session.output,
        &entries,
        |r, w| {
            for entry in r {
                writeln!(w, "{}\t{}", entry.symbol, entry.libraries.join(" "))?;
            }
            Ok(())
        },
        |r, w| {
            let heading = match (&args.library, args.undefined) {
                (Some(_), _) => "Symbols defined by the library",
                (None, true) => "Undefined symbols",
                (None, false) => "Defined symbols",
            };
            writeln!(w, "{heading} ({}):", r.len())?;
            for entry in r {
                writeln!(w, "  {:<40} {}", entry.symbol, entry.libraries.join(", "))?;
            }
            Ok(())
        },
    )
}
