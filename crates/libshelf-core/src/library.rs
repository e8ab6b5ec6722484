//! Library records and the platform naming convention.
//!
//! A library is keyed by its *identifier*: the file name with any directory,
//! platform suffix and `lib` prefix removed (`/usr/lib/libfoo.so` → `foo`).
//! The original file name is kept alongside so that static and dynamic
//! variants sharing an identifier can be told apart on lookup.

use std::collections::BTreeSet;
use std::path::Path;

/// A compiled artifact known to the catalog.
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    file_name: String,
    /// System libraries are never listed as external requirements.
    pub system: bool,
    /// Optional batch-grouping tag recorded at analysis time.
    pub package: Option<String>,
    dependencies: BTreeSet<String>,
}

impl Library {
    /// Create a library record from a file name (directories are dropped).
    #[must_use]
    pub fn new(file_name: &str, system: bool) -> Self {
        let file_name = base_name(file_name).to_string();
        Self {
            name: canonical_name(&file_name),
            file_name,
            system,
            package: None,
            dependencies: BTreeSet::new(),
        }
    }

    /// Canonical identifier (`foo` for `libfoo.so`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original file name including extension.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Libraries this one directly requires.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Record a direct requirement. Returns `true` if it was new.
    pub fn add_dependency(&mut self, dependency: impl Into<String>) -> bool {
        self.dependencies.insert(dependency.into())
    }

    /// Drop a direct requirement. Returns `true` if it was present.
    pub fn remove_dependency(&mut self, dependency: &str) -> bool {
        self.dependencies.remove(dependency)
    }
}

impl PartialEq for Library {
    fn eq(&self, other: &Self) -> bool {
        self.file_name == other.file_name
    }
}

impl Eq for Library {}

/// How an artifact must be handed to the symbol-table tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `.a` archive: regular symbol table.
    Static,
    /// `.so` / `.so.N` shared object: dynamic symbol table.
    Shared,
}

/// Classify a path by its file name, or `None` for anything that is not a
/// static archive or shared object.
#[must_use]
pub fn artifact_kind(path: &Path) -> Option<ArtifactKind> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".a") {
        Some(ArtifactKind::Static)
    } else if name.ends_with(".so") || name.contains(".so.") {
        Some(ArtifactKind::Shared)
    } else {
        None
    }
}

/// Canonical identifier for a library name or path.
///
/// ```
/// use libshelf_core::library::canonical_name;
///
/// assert_eq!(canonical_name("libfoo.so"), "foo");
/// assert_eq!(canonical_name("/lib64/libm.so.6"), "m");
/// assert_eq!(canonical_name("bar"), "bar");
/// ```
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let (stem, _) = split_suffix(base_name(name));
    stem.strip_prefix("lib").unwrap_or(stem).to_string()
}

/// Extension of a library name, treating `.so.N` as `.so`.
///
/// Only `.a` and `.so` count; other dots belong to the identifier
/// (`python3.11`).
#[must_use]
pub fn extension(name: &str) -> Option<&'static str> {
    split_suffix(base_name(name)).1
}

/// Split a file name into stem and library suffix.
fn split_suffix(file: &str) -> (&str, Option<&'static str>) {
    if let Some(pos) = file.find(".so.").filter(|&pos| pos > 0) {
        return (&file[..pos], Some(".so"));
    }
    for suffix in [".so", ".a"] {
        if let Some(stem) = file.strip_suffix(suffix).filter(|stem| !stem.is_empty()) {
            return (stem, Some(suffix));
        }
    }
    (file, None)
}

/// `true` when `query` names an extension that differs from `stored`'s.
///
/// A query without extension never conflicts.
#[must_use]
pub fn conflicting_extension(query: &str, stored: &str) -> bool {
    extension(query).is_some_and(|ext| Some(ext) != extension(stored))
}

fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}
