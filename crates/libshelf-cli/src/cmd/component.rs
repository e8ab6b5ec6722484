//! `libshelf component` — group libraries under one recipe component.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cmd::Session;
use crate::output::render;

/// Arguments for `libshelf component`.
#[derive(Args, Debug)]
pub struct ComponentArgs {
    /// Component name.
    pub name: String,

    /// Library file names or shell-style globs (`libssl*.so`).
    #[arg(required_unless_present = "remove", value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Delete the component; its libraries become standalone nodes again.
    #[arg(long, conflicts_with = "patterns")]
    pub remove: bool,
}

#[derive(Debug, Serialize)]
struct ComponentOutput {
    component: String,
    members: Vec<String>,
}

pub fn run_component(args: &ComponentArgs, session: &mut Session) -> anyhow::Result<()> {
    if args.remove {
        return remove_component(&args.name, session);
    }
    debug!(
        component = %args.name,
        previous = ?session.catalog.component_members(&args.name),
        "redefining component"
    );
    let members = session.catalog.libraries_matching(&args.patterns)?;
    if members.is_empty() {
        warn!(component = %args.name, "no library matches the given patterns");
    }
    session
        .catalog
        .set_component_members(&args.name, members.iter().cloned());
    session.save()?;

    let result = ComponentOutput {
        component: args.name.clone(),
        members,
    };
    render(session.output, &result, |r, w| {
        writeln!(w, "✓ {}: {}", r.component, r.members.join(", "))
    })
}

fn remove_component(name: &str, session: &mut Session) -> anyhow::Result<()> {
    let Some(members) = session.catalog.remove_component(name) else {
        anyhow::bail!("component '{name}' not defined");
    };
    session.save()?;

    let result = ComponentOutput {
        component: name.to_string(),
        members: members.into_iter().collect(),
    };
    render(session.output, &result, |r, w| {
        writeln!(w, "✓ removed {} ({})", r.component, r.members.join(", "))
    })
}
