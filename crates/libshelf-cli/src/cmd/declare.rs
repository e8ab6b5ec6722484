//! `libshelf declare` — record dependencies that symbols cannot reveal.
//!
//! Some links (plugins loaded with `dlopen`, libraries pulled in through
//! linker flags) never show up as undefined symbols. Declared edges are
//! stored exactly like inferred ones.

use std::io::Write;

use clap::Args;
use libshelf_core::CatalogError;
use libshelf_graph::graph::{catalog_graph, would_create_cycle};
use serde::Serialize;
use tracing::warn;

use crate::cmd::Session;
use crate::output::render;

/// Arguments for `libshelf declare`.
#[derive(Args, Debug)]
pub struct DeclareArgs {
    /// The dependent library.
    pub library: String,

    /// Libraries it requires.
    #[arg(required = true, value_name = "DEP")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DeclareOutput {
    library: String,
    added: Vec<String>,
    existing: Vec<String>,
}

pub fn run_declare(args: &DeclareArgs, session: &mut Session) -> anyhow::Result<()> {
    let library = session
        .catalog
        .find_library(&args.library)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::NotFound(args.library.clone()))?;

    let mut result = DeclareOutput {
        library: library.clone(),
        added: Vec::new(),
        existing: Vec::new(),
    };
    let mut graph = catalog_graph(&session.catalog);
    for dep in &args.dependencies {
        let target = session
            .catalog
            .find_library(dep)
            .map_or_else(|| dep.clone(), str::to_string);
        if let Some(cycle) = would_create_cycle(&graph, &library, &target) {
            warn!(cycle = %cycle.join(" -> "), "declared dependency closes a cycle");
        }
        if session.catalog.add_dependency(&library, &target)? {
            graph.add_dependency(&library, &target);
            result.added.push(target);
        } else {
            result.existing.push(target);
        }
    }
    session.save()?;

    render(session.output, &result, |r, w| {
        for dep in &r.added {
            writeln!(w, "✓ {} requires {}", r.library, dep)?;
        }
        for dep in &r.existing {
            writeln!(w, "  {} already requires {}", r.library, dep)?;
        }
        Ok(())
    })
}
