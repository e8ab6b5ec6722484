//! `libshelf dependencies` — direct, minimized or recursive dependencies.

use std::io::Write;

use clap::Args;
use libshelf_graph::graph::sorted_libraries;
use serde::Serialize;

use crate::cmd::{NameArgs, Session};
use crate::output::render_mode;

/// Arguments for `libshelf dependencies`.
#[derive(Args, Debug)]
pub struct DependenciesArgs {
    /// Libraries to inspect.
    #[arg(required = true, value_name = "LIB")]
    pub libs: Vec<String>,

    /// Drop dependencies already implied by another dependency.
    #[arg(long, conflicts_with = "recursive")]
    pub minimize: bool,

    /// Include indirect dependencies, in link order.
    #[arg(short, long)]
    pub recursive: bool,

    /// Sort the printed lists lexicographically.
    #[arg(long)]
    pub sort: bool,

    #[command(flatten)]
    pub names: NameArgs,
}

#[derive(Debug, Serialize)]
struct LibraryDependencies {
    library: String,
    found: bool,
    dependencies: Vec<String>,
}

pub fn run_dependencies(args: &DependenciesArgs, session: &Session) -> anyhow::Result<()> {
    let format = session.name_format(&args.names);
    let mut result = Vec::with_capacity(args.libs.len());

    for lib in &args.libs {
        let Some(id) = session.catalog.find_library(lib) else {
            result.push(LibraryDependencies {
                library: lib.clone(),
                found: false,
                dependencies: Vec::new(),
            });
            continue;
        };

        let direct: Vec<String> = session.catalog.dependencies_of(id)?.iter().cloned().collect();
        let mut deps = if args.minimize {
            session.catalog.minimize_dependencies(&direct)
        } else if args.recursive {
            let known = session.known_libraries(&direct);
            sorted_libraries(&session.catalog, &known, true)?
        } else {
            direct
        };
        if args.sort {
            deps.sort();
        }

        result.push(LibraryDependencies {
            library: lib.clone(),
            found: true,
            dependencies: format.format_all(&deps),
        });
    }

    render_mode(
        session.output,
        &result,
        |r, w| {
            for entry in r {
                writeln!(w, "{}: {}", entry.library, entry.dependencies.join(" "))?;
            }
            Ok(())
        },
        |r, w| {
            writeln!(w, "Libraries dependencies:")?;
            for entry in r {
                if !entry.found {
                    writeln!(w, "- {}: <not found>", entry.library)?;
                } else if entry.dependencies.is_empty() {
                    writeln!(w, "- {}: <none>", entry.library)?;
                } else {
                    writeln!(w, "- {}: {}", entry.library, entry.dependencies.join(", "))?;
                }
            }
            Ok(())
        },
    )
}
