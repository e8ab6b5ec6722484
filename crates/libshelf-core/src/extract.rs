//! Symbol-table extraction from compiled libraries.
//!
//! # Overview
//!
//! Extraction turns one artifact into two lists of symbol names: the
//! symbols it exports and the symbols it needs from elsewhere. The
//! [`SymbolSource`] trait is the seam the analyzer talks to; the production
//! implementation, [`NmExtractor`], shells out to `nm` and parses its
//! output.
//!
//! - Static archives (`.a`) are read with `nm -C`.
//! - Shared objects (`.so`, `.so.N`) are read with `nm -C -D`.
//! - A `.so` file that is not an ELF binary is treated as a linker script;
//!   the libraries named by its `GROUP`/`INPUT` commands are extracted and
//!   merged under the script's own name.
//!
//! # Symbol classes
//!
//! | nm type | meaning            | classified as |
//! |---------|--------------------|---------------|
//! | `T`     | text (code)        | defined       |
//! | `R`     | read-only data     | defined       |
//! | `D`     | initialized data   | defined       |
//! | `B`     | bss                | defined       |
//! | `W`/`V` | weak symbol/object | defined       |
//! | `U`     | undefined          | undefined     |
//!
//! Every other type (including all lower-case, file-local types) is
//! ignored. A symbol-version suffix (`memcpy@GLIBC_2.14`) is stripped.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::error::ErrorCode;
use crate::library::{ArtifactKind, artifact_kind};

static NM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{16})?\s+(?P<kind>[A-Za-z])\s+(?P<symbol>.+)$")
        .expect("nm line pattern is valid")
});

static SYMBOL_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@+.*$").expect("symbol version pattern is valid"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment pattern is valid"));

static AS_NEEDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AS_NEEDED\s*\([^)]*\)").expect("AS_NEEDED pattern is valid"));

static LINK_INPUTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:GROUP|INPUT)\s*\((?P<inputs>[^)]*)\)").expect("GROUP/INPUT pattern is valid")
});

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while extracting a symbol table.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported artifact {}: expected a .a or .so library", path.display())]
    Unsupported { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program} on {}: {source}", path.display())]
    Spawn {
        program: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed on {} ({status}): {stderr}", path.display())]
    ToolFailed {
        program: String,
        path: PathBuf,
        status: String,
        stderr: String,
    },
}

impl ExtractError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unsupported { .. } => ErrorCode::UnsupportedArtifact,
            Self::Io { .. } | Self::Spawn { .. } | Self::ToolFailed { .. } => {
                ErrorCode::ExtractionFailed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Symbol tables
// ---------------------------------------------------------------------------

/// Exported and required symbol names of one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub defined: Vec<String>,
    pub undefined: Vec<String>,
}

impl SymbolTable {
    /// Append another table, keeping first-seen order and dropping repeats.
    pub fn merge(&mut self, other: Self) {
        self.defined.extend(other.defined);
        self.undefined.extend(other.undefined);
        self.normalize();
    }

    /// Deduplicate both lists and drop undefined names the artifact itself
    /// defines.
    fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.defined.retain(|s| seen.insert(s.clone()));
        let mut pending = HashSet::new();
        self.undefined
            .retain(|s| !seen.contains(s) && pending.insert(s.clone()));
    }
}

/// Parse the textual output of `nm`.
///
/// Lines that do not look like a symbol entry (archive member headers,
/// blank lines, warnings) are skipped.
#[must_use]
pub fn parse_nm_output(output: &str) -> SymbolTable {
    let mut table = SymbolTable::default();
    for line in output.lines() {
        let Some(caps) = NM_LINE.captures(line) else {
            if !line.trim().is_empty() {
                trace!(line, "skipping non-symbol nm line");
            }
            continue;
        };
        let symbol = SYMBOL_VERSION.replace(&caps["symbol"], "").trim_end().to_string();
        if symbol.is_empty() {
            continue;
        }
        match &caps["kind"] {
            "T" | "R" | "D" | "B" | "W" | "V" => table.defined.push(symbol),
            "U" => table.undefined.push(symbol),
            _ => {}
        }
    }
    table.normalize();
    table
}

/// Library paths named by the `GROUP` and `INPUT` commands of a linker
/// script. Comments and `AS_NEEDED(...)` groups are ignored.
#[must_use]
pub fn parse_link_script(script: &str) -> Vec<String> {
    let without_comments = BLOCK_COMMENT.replace_all(script, " ");
    let without_as_needed = AS_NEEDED.replace_all(&without_comments, " ");
    LINK_INPUTS
        .captures_iter(&without_as_needed)
        .flat_map(|caps| {
            caps["inputs"]
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `true` when the file starts with the ELF magic number.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub fn is_elf(path: &Path) -> std::io::Result<bool> {
    let mut head = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut head) {
        Ok(()) => Ok(head == ELF_MAGIC),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err),
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Anything that can produce the symbol table of a library file.
pub trait SymbolSource {
    /// Extract the symbol table of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the artifact is unsupported or the
    /// extraction tool fails.
    fn symbols(&self, path: &Path) -> Result<SymbolTable, ExtractError>;
}

/// [`SymbolSource`] backed by the `nm` command-line tool.
#[derive(Debug, Clone)]
pub struct NmExtractor {
    program: String,
    demangle: bool,
}

impl Default for NmExtractor {
    fn default() -> Self {
        Self::new("nm")
    }
}

impl NmExtractor {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            demangle: true,
        }
    }

    #[must_use]
    pub const fn with_demangle(mut self, demangle: bool) -> Self {
        self.demangle = demangle;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn run_nm(&self, path: &Path, kind: ArtifactKind) -> Result<SymbolTable, ExtractError> {
        let mut cmd = Command::new(&self.program);
        if self.demangle {
            cmd.arg("-C");
        }
        if kind == ArtifactKind::Shared {
            cmd.arg("-D");
        }
        cmd.arg(path);
        trace!(?cmd, "running symbol-table tool");

        let output = cmd.output().map_err(|source| ExtractError::Spawn {
            program: self.program.clone(),
            path: path.to_path_buf(),
            source,
        })?;
        if !output.status.success() {
            return Err(ExtractError::ToolFailed {
                program: self.program.clone(),
                path: path.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(parse_nm_output(&String::from_utf8_lossy(&output.stdout)))
    }

    fn link_script_symbols(&self, script: &Path) -> Result<SymbolTable, ExtractError> {
        let text = std::fs::read_to_string(script).map_err(|source| ExtractError::Io {
            path: script.to_path_buf(),
            source,
        })?;
        let inputs = parse_link_script(&text);
        debug!(script = %script.display(), ?inputs, "linker script inputs");

        let base = script.parent().unwrap_or_else(|| Path::new(""));
        let mut table = SymbolTable::default();
        for input in inputs {
            if input.starts_with('-') {
                debug!(input = %input, "skipping linker flag in script");
                continue;
            }
            let input_path = base.join(&input);
            let kind = artifact_kind(&input_path)
                .ok_or_else(|| ExtractError::Unsupported { path: input_path.clone() })?;
            table.merge(self.run_nm(&input_path, kind)?);
        }
        Ok(table)
    }
}

impl SymbolSource for NmExtractor {
    #[instrument(skip(self), fields(program = %self.program))]
    fn symbols(&self, path: &Path) -> Result<SymbolTable, ExtractError> {
        let kind = artifact_kind(path).ok_or_else(|| ExtractError::Unsupported {
            path: path.to_path_buf(),
        })?;

        if kind == ArtifactKind::Shared {
            let elf = is_elf(path).map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if !elf {
                return self.link_script_symbols(path);
            }
        }
        self.run_nm(path, kind)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
