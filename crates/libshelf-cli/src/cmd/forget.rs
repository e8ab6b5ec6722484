//! `libshelf forget` — drop libraries from the catalog.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use tracing::warn;

use crate::cmd::Session;
use crate::output::render;

/// Arguments for `libshelf forget`.
#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Libraries to remove, together with their symbols and edges.
    #[arg(required = true, value_name = "LIB")]
    pub libs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ForgetOutput {
    removed: Vec<String>,
    not_found: Vec<String>,
}

pub fn run_forget(args: &ForgetArgs, session: &mut Session) -> anyhow::Result<()> {
    let mut result = ForgetOutput {
        removed: Vec::new(),
        not_found: Vec::new(),
    };
    for lib in &args.libs {
        match session.catalog.remove_library(lib) {
            Some(removed) => result.removed.push(removed.file_name().to_string()),
            None => {
                warn!(library = %lib, "library not defined; nothing to forget");
                result.not_found.push(lib.clone());
            }
        }
    }
    if !result.removed.is_empty() {
        session.save()?;
    }

    render(session.output, &result, |r, w| {
        for lib in &r.removed {
            writeln!(w, "✓ forgot {lib}")?;
        }
        Ok(())
    })
}
