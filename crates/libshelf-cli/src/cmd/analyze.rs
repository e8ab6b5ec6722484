//! `libshelf analyze` — extract symbol tables and infer dependencies.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use libshelf_core::AnalysisOptions;
use libshelf_core::analyze::analyze_paths;
use libshelf_core::extract::NmExtractor;
use serde::Serialize;
use tracing::info;

use crate::cmd::Session;
use crate::output::render_mode;

/// Arguments for `libshelf analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Library files or directories to scan recursively.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Mark the analyzed libraries as system libraries.
    #[arg(long)]
    pub system: bool,

    /// Tag the analyzed libraries with a package name.
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzedLibrary {
    library: String,
    defined: usize,
    undefined: usize,
    new_edges: usize,
    pending: usize,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    analyzed: Vec<AnalyzedLibrary>,
    skipped: Vec<String>,
    missing: Vec<String>,
}

pub fn run_analyze(args: &AnalyzeArgs, session: &mut Session) -> anyhow::Result<()> {
    let extractor = NmExtractor::new(session.config.nm_program.clone())
        .with_demangle(session.config.project.extractor.demangle);
    let options = AnalysisOptions {
        system: args.system,
        package: args.package.clone(),
    };

    let report = analyze_paths(&mut session.catalog, &extractor, &args.paths, &options)?;
    session.save()?;
    info!(
        analyzed = report.analyzed.len(),
        skipped = report.skipped.len(),
        "analysis finished"
    );

    let result = AnalyzeOutput {
        analyzed: report
            .analyzed
            .into_iter()
            .map(|s| AnalyzedLibrary {
                library: s.library,
                defined: s.defined,
                undefined: s.undefined,
                new_edges: s.new_edges,
                pending: s.pending,
            })
            .collect(),
        skipped: report.skipped,
        missing: report
            .missing
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    };

    render_mode(
        session.output,
        &result,
        |r, w| {
            for lib in &r.analyzed {
                writeln!(w, "{}", lib.library)?;
            }
            Ok(())
        },
        |r, w| {
            for lib in &r.analyzed {
                writeln!(
                    w,
                    "analyzed {}: {} defined, {} undefined, {} new edges",
                    lib.library, lib.defined, lib.undefined, lib.new_edges
                )?;
            }
            for lib in &r.skipped {
                writeln!(w, "skipped {lib} (already analyzed)")?;
            }
            for path in &r.missing {
                writeln!(w, "missing {path}")?;
            }
            Ok(())
        },
    )
}
