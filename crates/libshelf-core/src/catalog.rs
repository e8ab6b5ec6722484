//! The library catalog: per-library adjacency, metadata and components.
//!
//! # Overview
//!
//! [`Catalog`] is the session value every command operates on. It owns:
//!
//! - the known [`Library`] records, keyed by canonical identifier;
//! - the [`SymbolIndex`] used to infer edges from symbol tables;
//! - the [`Components`] grouping.
//!
//! Edges come from two sources: symbol resolution performed by
//! [`Catalog::register_analysis`], and explicit declarations through
//! [`Catalog::add_dependency`]. Both end up in the same per-library
//! dependency set, stored as library file names.
//!
//! ## Lookup rules
//!
//! Libraries may be named by identifier (`foo`), by file name
//! (`libfoo.so`) or by path. A name that carries an extension only matches
//! a library stored with the same extension; `libfoo.a` never resolves to
//! `libfoo.so`.

#![allow(clippy::module_name_repetitions)]

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use globset::{Glob, GlobSetBuilder};
use tracing::{debug, instrument, warn};

use crate::components::Components;
use crate::error::ErrorCode;
use crate::library::{Library, canonical_name, conflicting_extension};
use crate::symbols::SymbolIndex;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by catalog queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The requested library is not part of the catalog.
    #[error("'{0}' is not a library")]
    NotFound(String),

    /// A library-file glob could not be compiled.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
}

impl CatalogError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::LibraryNotFound,
            Self::InvalidPattern { .. } => ErrorCode::InvalidPattern,
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis input / output
// ---------------------------------------------------------------------------

/// Metadata attached to libraries registered by one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub system: bool,
    pub package: Option<String>,
}

/// What a single [`Catalog::register_analysis`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub library: String,
    pub defined: usize,
    pub undefined: usize,
    /// Edges added in either direction (dependents resolved + needs met).
    pub new_edges: usize,
    /// References left waiting for a definer.
    pub pending: usize,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Libraries, symbol tables and components for one session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    libraries: BTreeMap<String, Library>,
    symbols: SymbolIndex,
    components: Components,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a catalog from previously persisted parts.
    #[must_use]
    pub fn from_parts(libraries: Vec<Library>, symbols: SymbolIndex, components: Components) -> Self {
        let libraries = libraries
            .into_iter()
            .map(|lib| (lib.name().to_string(), lib))
            .collect();
        Self {
            libraries,
            symbols,
            components,
        }
    }

    // -- libraries ----------------------------------------------------------

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    /// File names of every known library, ordered by identifier.
    #[must_use]
    pub fn library_files(&self) -> Vec<String> {
        self.libraries
            .values()
            .map(|lib| lib.file_name().to_string())
            .collect()
    }

    /// `true` when a library with the same identifier is known.
    #[must_use]
    pub fn is_library(&self, name: &str) -> bool {
        self.libraries.contains_key(&canonical_name(name))
    }

    /// Look a library up by identifier, file name or path.
    ///
    /// Returns `None` when the name carries an extension that differs from
    /// the stored file's extension.
    #[must_use]
    pub fn get_library(&self, name: &str) -> Option<&Library> {
        self.libraries
            .get(&canonical_name(name))
            .filter(|lib| !conflicting_extension(name, lib.file_name()))
    }

    /// File name of the library matching `name`.
    #[must_use]
    pub fn find_library(&self, name: &str) -> Option<&str> {
        self.get_library(name).map(Library::file_name)
    }

    /// Register a library. An existing entry with the same file name keeps
    /// its dependencies; an entry with a different file name is replaced.
    pub fn add_library(&mut self, file_name: &str, options: &AnalysisOptions) -> &mut Library {
        let mut lib = Library::new(file_name, options.system);
        lib.package.clone_from(&options.package);

        match self.libraries.entry(lib.name().to_string()) {
            Entry::Vacant(slot) => slot.insert(lib),
            Entry::Occupied(slot) => {
                let existing = slot.into_mut();
                if existing.file_name() == lib.file_name() {
                    existing.system = options.system;
                    if options.package.is_some() {
                        existing.package.clone_from(&options.package);
                    }
                } else {
                    warn!(
                        previous = existing.file_name(),
                        replacement = lib.file_name(),
                        "library identifier reused; replacing previous entry"
                    );
                    *existing = lib;
                }
                existing
            }
        }
    }

    /// Remove a library together with its symbol entries, every edge
    /// pointing at it, and its component memberships.
    ///
    /// `name` resolves like [`Catalog::get_library`]; a conflicting
    /// extension removes nothing.
    pub fn remove_library(&mut self, name: &str) -> Option<Library> {
        let key = self.get_library(name)?.name().to_string();
        let removed = self.libraries.remove(&key)?;

        self.symbols.forget_library(removed.file_name());
        for lib in self.libraries.values_mut() {
            let stale: Vec<String> = lib
                .dependencies()
                .iter()
                .filter(|dep| {
                    canonical_name(dep) == key && !conflicting_extension(dep, removed.file_name())
                })
                .cloned()
                .collect();
            for dep in stale {
                lib.remove_dependency(&dep);
            }
        }
        self.components.drop_member(removed.file_name());

        debug!(library = removed.file_name(), "library removed");
        Some(removed)
    }

    // -- edges --------------------------------------------------------------

    /// Declare that `src` requires `tgt`.
    ///
    /// Both names resolve like [`Catalog::get_library`]. The target is
    /// stored as its file name when it is a known library and verbatim
    /// otherwise. Self-edges are ignored. Returns `true` when the edge is
    /// new.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when `src` is not a library.
    pub fn add_dependency(&mut self, src: &str, tgt: &str) -> Result<bool, CatalogError> {
        let src_key = self
            .get_library(src)
            .ok_or_else(|| CatalogError::NotFound(src.to_string()))?
            .name()
            .to_string();
        let target = match self.get_library(tgt) {
            Some(lib) if lib.name() == src_key => return Ok(false),
            Some(lib) => lib.file_name().to_string(),
            None => tgt.to_string(),
        };
        let lib = self
            .libraries
            .get_mut(&src_key)
            .ok_or_else(|| CatalogError::NotFound(src.to_string()))?;
        Ok(lib.add_dependency(target))
    }

    /// Direct dependencies of a library.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when `name` does not resolve.
    pub fn dependencies_of(&self, name: &str) -> Result<&BTreeSet<String>, CatalogError> {
        self.get_library(name)
            .map(Library::dependencies)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Every library reachable from `name`, excluding `name` itself unless
    /// it sits on a cycle. Unknown dependencies are included but not
    /// expanded.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when `name` does not resolve.
    pub fn transitive_dependencies_of(&self, name: &str) -> Result<BTreeSet<String>, CatalogError> {
        let mut closure = BTreeSet::new();
        let mut queue: VecDeque<String> = self.dependencies_of(name)?.iter().cloned().collect();
        while let Some(item) = queue.pop_front() {
            if !closure.insert(item.clone()) {
                continue;
            }
            if let Some(lib) = self.get_library(&item) {
                queue.extend(
                    lib.dependencies()
                        .iter()
                        .filter(|dep| !closure.contains(*dep))
                        .cloned(),
                );
            }
        }
        Ok(closure)
    }

    /// Drop every entry of `libs` that is reachable from another entry.
    ///
    /// Input order is preserved. Entries that reach each other (a cycle)
    /// are all kept.
    #[must_use]
    pub fn minimize_dependencies(&self, libs: &[String]) -> Vec<String> {
        let closures: Vec<HashSet<String>> = libs
            .iter()
            .map(|lib| {
                self.transitive_dependencies_of(lib)
                    .map(|deps| deps.iter().map(|d| canonical_name(d)).collect())
                    .unwrap_or_default()
            })
            .collect();
        let keys: Vec<String> = libs.iter().map(|lib| canonical_name(lib)).collect();

        libs.iter()
            .enumerate()
            .filter(|(i, _)| {
                !closures.iter().enumerate().any(|(j, reach)| {
                    j != *i
                        && keys[j] != keys[*i]
                        && reach.contains(&keys[*i])
                        && !closures[*i].contains(&keys[j])
                })
            })
            .map(|(_, lib)| lib.clone())
            .collect()
    }

    // -- symbols ------------------------------------------------------------

    #[must_use]
    pub const fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }

    /// Register the definer of `symbol`; see [`SymbolIndex::define_symbol`].
    pub fn define_symbol(&mut self, symbol: &str, library_file: &str) -> BTreeSet<String> {
        self.symbols.define_symbol(symbol, library_file)
    }

    pub fn add_undefined_reference(&mut self, symbol: &str, library_file: &str) {
        self.symbols.add_undefined_reference(symbol, library_file);
    }

    #[must_use]
    pub fn definer_of(&self, symbol: &str) -> Option<&str> {
        self.symbols.definer_of(symbol)
    }

    /// Add a library and resolve its symbol tables against the catalog.
    ///
    /// For each defined symbol, every library waiting for it gains an edge
    /// to `file_name`. For each undefined symbol, an edge is added right
    /// away when a definer is known, otherwise the reference is queued.
    /// Symbols listed in both tables are treated as defined only.
    #[instrument(skip(self, defined, undefined), fields(defined = defined.len(), undefined = undefined.len()))]
    pub fn register_analysis(
        &mut self,
        file_name: &str,
        defined: &[String],
        undefined: &[String],
        options: &AnalysisOptions,
    ) -> AnalysisSummary {
        let file = self.add_library(file_name, options).file_name().to_string();
        let mut summary = AnalysisSummary {
            library: file.clone(),
            defined: defined.len(),
            ..AnalysisSummary::default()
        };

        for symbol in defined {
            for dependent in self.symbols.define_symbol(symbol, &file) {
                if self.link(&dependent, &file) {
                    summary.new_edges += 1;
                }
            }
        }

        let own: HashSet<&str> = defined.iter().map(String::as_str).collect();
        for symbol in undefined.iter().filter(|s| !own.contains(s.as_str())) {
            summary.undefined += 1;
            match self.symbols.definer_of(symbol).map(str::to_string) {
                Some(definer) => {
                    if self.link(&file, &definer) {
                        summary.new_edges += 1;
                    }
                }
                None => {
                    self.symbols.add_undefined_reference(symbol, &file);
                    summary.pending += 1;
                }
            }
        }

        debug!(
            library = %file,
            new_edges = summary.new_edges,
            pending = summary.pending,
            "analysis registered"
        );
        summary
    }

    fn link(&mut self, src: &str, tgt: &str) -> bool {
        match self.add_dependency(src, tgt) {
            Ok(added) => added,
            Err(err) => {
                warn!(%err, dependent = src, definer = tgt, "dropping edge from unknown library");
                false
            }
        }
    }

    // -- components ---------------------------------------------------------

    #[must_use]
    pub const fn components(&self) -> &Components {
        &self.components
    }

    /// Replace a component's membership and invalidate the reverse index.
    pub fn set_component_members<I, S>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components.set_members(name, members);
    }

    /// Library file names matching any of the shell-style `patterns`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidPattern`] for a pattern that does not compile.
    pub fn libraries_matching(&self, patterns: &[String]) -> Result<Vec<String>, CatalogError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| CatalogError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| CatalogError::InvalidPattern {
            pattern: patterns.join(" "),
            source,
        })?;
        Ok(self
            .library_files()
            .into_iter()
            .filter(|file| set.is_match(file))
            .collect())
    }

    pub fn remove_component(&mut self, name: &str) -> Option<BTreeSet<String>> {
        self.components.remove(name)
    }

    #[must_use]
    pub fn is_component(&self, name: &str) -> bool {
        self.components.is_component(name)
    }

    #[must_use]
    pub fn component_members(&self, name: &str) -> BTreeSet<String> {
        self.components.members_of(name).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn owner_of(&self, library: &str) -> Option<&str> {
        self.components.owner_of(library)
    }

    // -- packages -----------------------------------------------------------

    #[must_use]
    pub fn is_package(&self, name: &str) -> bool {
        self.libraries
            .values()
            .any(|lib| lib.package.as_deref() == Some(name))
    }

    /// File names of the libraries tagged with `package`.
    #[must_use]
    pub fn package_libraries(&self, package: &str) -> Vec<String> {
        self.libraries
            .values()
            .filter(|lib| lib.package.as_deref() == Some(package))
            .map(|lib| lib.file_name().to_string())
            .collect()
    }

    // -- argument helpers ---------------------------------------------------

    /// Expand package and component names into their libraries.
    #[must_use]
    pub fn expand_items(&self, items: &[String]) -> BTreeSet<String> {
        let mut libraries = BTreeSet::new();
        for item in items {
            if self.is_package(item) {
                libraries.extend(self.package_libraries(item));
            } else if self.is_component(item) {
                libraries.extend(self.component_members(item));
            } else {
                libraries.insert(item.clone());
            }
        }
        libraries
    }

    /// Keep the names whose system flag equals `system`. Unknown names
    /// count as non-system.
    #[must_use]
    pub fn filter_system<'a, I>(&self, libs: I, system: bool) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        libs.into_iter()
            .filter(|name| self.get_library(name).is_some_and(|lib| lib.system) == system)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
