//! Subcommand implementations.
//!
//! Every command runs against a [`Session`]: the resolved configuration and
//! the catalog loaded from the snapshot. Mutating commands call
//! [`Session::save`] once, at the end.

pub mod analyze;
pub mod component;
pub mod cppinfo;
pub mod declare;
pub mod dependencies;
pub mod find;
pub mod forget;
pub mod graph;
pub mod sort;
pub mod symbols;

use std::path::Path;

use anyhow::Context as _;
use clap::Args;
use libshelf_core::Catalog;
use libshelf_core::config::{EffectiveConfig, NameStyle, resolve_config};
use libshelf_core::library::canonical_name;
use libshelf_core::snapshot::SnapshotFile;
use tracing::{debug, warn};

use crate::output::OutputMode;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Configuration plus the catalog a command operates on.
pub struct Session {
    pub config: EffectiveConfig,
    pub catalog: Catalog,
    pub output: OutputMode,
    snapshot: SnapshotFile,
}

impl Session {
    /// Resolve configuration and load the snapshot.
    pub fn open(project: Option<&Path>, format: Option<OutputMode>) -> anyhow::Result<Self> {
        let config = resolve_config(project, format.map(OutputMode::name))
            .map_err(|err| err.context(ConfigFailure))?;
        let output = OutputMode::from_name(&config.resolved_output);
        let snapshot = SnapshotFile::new(&config.snapshot_path);
        let catalog = snapshot.load()?;
        debug!(
            snapshot = %config.snapshot_path.display(),
            libraries = catalog.libraries().count(),
            "session opened"
        );
        Ok(Self {
            config,
            catalog,
            output,
            snapshot,
        })
    }

    /// Persist the catalog to the snapshot file.
    pub fn save(&self) -> anyhow::Result<()> {
        self.snapshot.save(&self.catalog).with_context(|| {
            format!(
                "failed to save snapshot {}",
                self.config.snapshot_path.display()
            )
        })
    }

    /// Resolve each name through the catalog, warning about unknown ones.
    pub fn known_libraries(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| {
                let found = self.catalog.find_library(name);
                if found.is_none() {
                    warn!(library = %name, "library not defined; skipping");
                }
                found.map(str::to_string)
            })
            .collect()
    }

    /// Name formatting from `args`, falling back to the config file.
    pub fn name_format(&self, args: &NameArgs) -> NameFormat {
        NameFormat {
            style: args.names.unwrap_or(self.config.project.output.names),
            quote: args
                .quote
                .clone()
                .unwrap_or_else(|| self.config.project.output.quote.clone()),
        }
    }
}

/// Marker context attached to configuration failures so `main` can map them
/// onto their error code.
#[derive(Debug, Clone, Copy)]
pub struct ConfigFailure;

impl std::fmt::Display for ConfigFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("failed to load configuration")
    }
}

// ---------------------------------------------------------------------------
// Name formatting
// ---------------------------------------------------------------------------

/// `--names` / `--quote` options shared by the printing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct NameArgs {
    /// Print identifiers (`short`) or file names (`full`).
    #[arg(long, value_name = "STYLE")]
    pub names: Option<NameStyle>,

    /// String wrapped around every printed name.
    #[arg(long, value_name = "QUOTE")]
    pub quote: Option<String>,
}

/// How library names are printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFormat {
    pub style: NameStyle,
    pub quote: String,
}

impl NameFormat {
    pub fn format(&self, file_name: &str) -> String {
        let name = match self.style {
            NameStyle::Short => canonical_name(file_name),
            NameStyle::Full => file_name.to_string(),
        };
        format!("{q}{name}{q}", q = self.quote)
    }

    pub fn format_all<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().map(|name| self.format(name)).collect()
    }
}

/// Expand `\n`, `\t` and `\\` in a separator given on the command line.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
