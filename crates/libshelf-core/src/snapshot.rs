//! JSON snapshot persistence for the catalog.
//!
//! # Format
//!
//! ```json
//! {
//!   "libraries": [
//!     { "file": "libapp.so", "system": false, "package": "demo", "needs": ["libz.so"] }
//!   ],
//!   "defined": { "compress": "libz.so" },
//!   "undefined": { "missing_fn": ["libapp.so"] },
//!   "components": { "core": ["libapp.so"] }
//! }
//! ```
//!
//! Maps and sets are ordered, so saving the same catalog twice produces
//! byte-identical files. Writes go through a sibling temp file and a rename.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::catalog::Catalog;
use crate::components::Components;
use crate::error::ErrorCode;
use crate::library::Library;
use crate::symbols::SymbolIndex;

/// Snapshot file name used when no path is configured.
pub const DEFAULT_SNAPSHOT: &str = "libshelf.json";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {} is not valid: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no snapshot path configured")]
    PathUnset,
}

impl SnapshotError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Corrupt { .. } => ErrorCode::SnapshotCorrupt,
            Self::PathUnset => ErrorCode::SnapshotPathUnset,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotDoc {
    #[serde(default)]
    libraries: Vec<LibraryRecord>,
    #[serde(default)]
    defined: BTreeMap<String, String>,
    #[serde(default)]
    undefined: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    components: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryRecord {
    file: String,
    #[serde(default)]
    system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    package: Option<String>,
    #[serde(default)]
    needs: BTreeSet<String>,
}

impl From<&Catalog> for SnapshotDoc {
    fn from(catalog: &Catalog) -> Self {
        Self {
            libraries: catalog
                .libraries()
                .map(|lib| LibraryRecord {
                    file: lib.file_name().to_string(),
                    system: lib.system,
                    package: lib.package.clone(),
                    needs: lib.dependencies().clone(),
                })
                .collect(),
            defined: catalog.symbols().defined_table().clone(),
            undefined: catalog.symbols().undefined_table().clone(),
            components: catalog
                .components()
                .iter()
                .map(|(name, members)| (name.to_string(), members.clone()))
                .collect(),
        }
    }
}

impl From<SnapshotDoc> for Catalog {
    fn from(doc: SnapshotDoc) -> Self {
        let libraries = doc
            .libraries
            .into_iter()
            .map(|record| {
                let mut lib = Library::new(&record.file, record.system);
                lib.package = record.package;
                for need in record.needs {
                    lib.add_dependency(need);
                }
                lib
            })
            .collect();

        let mut components = Components::new();
        for (name, members) in doc.components {
            components.set_members(&name, members);
        }

        Self::from_parts(
            libraries,
            SymbolIndex::from_tables(doc.defined, doc.undefined),
            components,
        )
    }
}

/// Location of the session snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFile {
    path: Option<PathBuf>,
}

impl SnapshotFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A snapshot with no backing file: loads empty, refuses to save.
    #[must_use]
    pub const fn unset() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the catalog. A missing file (or no path) yields an empty one.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Io`] if the file exists but cannot be read,
    /// [`SnapshotError::Corrupt`] if it is not a valid snapshot.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> Result<Catalog, SnapshotError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(Catalog::new());
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("snapshot not found; starting empty");
                return Ok(Catalog::new());
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let doc: SnapshotDoc =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(libraries = doc.libraries.len(), "snapshot loaded");
        Ok(doc.into())
    }

    /// Persist the catalog.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::PathUnset`] when no path is configured,
    /// [`SnapshotError::Io`] on write failure.
    #[instrument(skip(self, catalog), fields(path = ?self.path))]
    pub fn save(&self, catalog: &Catalog) -> Result<(), SnapshotError> {
        let path = self.path.as_deref().ok_or(SnapshotError::PathUnset)?;
        let doc = SnapshotDoc::from(catalog);
        let mut json = serde_json::to_string_pretty(&doc).map_err(|source| SnapshotError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        json.push('\n');

        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        debug!(libraries = doc.libraries.len(), "snapshot saved");
        Ok(())
    }
}
