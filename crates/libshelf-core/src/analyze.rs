//! Batch analysis of library files and directories.
//!
//! Explicit file arguments are always handed to the [`SymbolSource`];
//! directories are walked recursively and only `.a`/`.so`/`.so.N` entries
//! are considered. Libraries whose identifier is already in the catalog are
//! skipped, so re-running an analysis over the same tree is cheap and a
//! `libfoo.so` → `libfoo.so.1` symlink pair is analyzed once.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::catalog::{AnalysisOptions, AnalysisSummary, Catalog};
use crate::extract::{ExtractError, SymbolSource};
use crate::library::artifact_kind;

/// Outcome of [`analyze_paths`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeReport {
    pub analyzed: Vec<AnalysisSummary>,
    /// Libraries already present in the catalog.
    pub skipped: Vec<String>,
    /// Arguments that are neither a file nor a directory.
    pub missing: Vec<PathBuf>,
}

/// Analyze every library reachable from `paths` and register it.
///
/// # Errors
///
/// Returns the first [`ExtractError`]; libraries registered before the
/// failure stay in the catalog.
#[instrument(skip(catalog, source, paths), fields(paths = paths.len()))]
pub fn analyze_paths<S>(
    catalog: &mut Catalog,
    source: &S,
    paths: &[PathBuf],
    options: &AnalysisOptions,
) -> Result<AnalyzeReport, ExtractError>
where
    S: SymbolSource + ?Sized,
{
    let mut report = AnalyzeReport::default();
    for path in paths {
        if path.is_file() {
            analyze_one(catalog, source, path, options, &mut report)?;
        } else if path.is_dir() {
            for file in library_files_under(path)? {
                analyze_one(catalog, source, &file, options, &mut report)?;
            }
        } else {
            warn!(path = %path.display(), "path does not exist; skipping");
            report.missing.push(path.clone());
        }
    }
    Ok(report)
}

/// Library files under `dir`, in file-name order.
///
/// # Errors
///
/// Returns [`ExtractError::Io`] if the directory cannot be traversed.
pub fn library_files_under(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| ExtractError::Io {
            path: dir.to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() && artifact_kind(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn analyze_one<S>(
    catalog: &mut Catalog,
    source: &S,
    path: &Path,
    options: &AnalysisOptions,
    report: &mut AnalyzeReport,
) -> Result<(), ExtractError>
where
    S: SymbolSource + ?Sized,
{
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ExtractError::Unsupported {
            path: path.to_path_buf(),
        })?;

    if catalog.is_library(&file_name) {
        report.skipped.push(file_name);
        return Ok(());
    }

    info!(path = %path.display(), "analyzing");
    let table = source.symbols(path)?;
    let summary = catalog.register_analysis(&file_name, &table.defined, &table.undefined, options);
    report.analyzed.push(summary);
    Ok(())
}
