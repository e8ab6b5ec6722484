//! Symbol definition and pending-reference tables.
//!
//! # Resolution model
//!
//! The index keeps two tables keyed by symbol name:
//!
//! - `defined`: the library file that provides the symbol. At most one
//!   definer is tracked; a later registration replaces an earlier one.
//! - `undefined`: library files that need the symbol while no definer is
//!   known yet.
//!
//! Defining a symbol drains its pending set and hands it back to the caller,
//! which turns every pending reference into a `dependent → definer` edge.
//! Edges therefore converge no matter in which order libraries are analyzed.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

/// Per-symbol definer and pending-reference tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolIndex {
    defined: BTreeMap<String, String>,
    undefined: BTreeMap<String, BTreeSet<String>>,
}

impl SymbolIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from persisted tables.
    #[must_use]
    pub const fn from_tables(
        defined: BTreeMap<String, String>,
        undefined: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self { defined, undefined }
    }

    /// Register `library_file` as the definer of `symbol`.
    ///
    /// Returns the libraries that were waiting for the symbol and clears
    /// their pending entry. Redefinition overwrites the previous definer.
    pub fn define_symbol(&mut self, symbol: &str, library_file: &str) -> BTreeSet<String> {
        let previous = self.defined.insert(symbol.to_string(), library_file.to_string());
        if let Some(previous) = previous.filter(|p| p.as_str() != library_file) {
            debug!(symbol, previous = %previous, definer = library_file, "symbol redefined");
        }
        self.undefined.remove(symbol).unwrap_or_default()
    }

    /// Record that `library_file` needs `symbol` while no definer is known.
    pub fn add_undefined_reference(&mut self, symbol: &str, library_file: &str) {
        self.undefined
            .entry(symbol.to_string())
            .or_default()
            .insert(library_file.to_string());
    }

    /// Library file currently defining `symbol`.
    #[must_use]
    pub fn definer_of(&self, symbol: &str) -> Option<&str> {
        self.defined.get(symbol).map(String::as_str)
    }

    /// Libraries still waiting for `symbol`.
    #[must_use]
    pub fn pending_for(&self, symbol: &str) -> BTreeSet<String> {
        self.undefined.get(symbol).cloned().unwrap_or_default()
    }

    pub fn defined_symbols(&self) -> impl Iterator<Item = &str> {
        self.defined.keys().map(String::as_str)
    }

    pub fn undefined_symbols(&self) -> impl Iterator<Item = &str> {
        self.undefined.keys().map(String::as_str)
    }

    /// Symbols defined by one library file.
    pub fn symbols_defined_by<'a>(&'a self, library_file: &'a str) -> impl Iterator<Item = &'a str> {
        self.defined
            .iter()
            .filter(move |(_, definer)| definer.as_str() == library_file)
            .map(|(symbol, _)| symbol.as_str())
    }

    /// Drop every definition owned by `library_file` and remove it from all
    /// pending sets. Pending sets that become empty are deleted.
    pub fn forget_library(&mut self, library_file: &str) {
        self.defined.retain(|_, definer| definer.as_str() != library_file);
        self.undefined.retain(|_, needers| {
            needers.remove(library_file);
            !needers.is_empty()
        });
    }

    #[must_use]
    pub const fn defined_table(&self) -> &BTreeMap<String, String> {
        &self.defined
    }

    #[must_use]
    pub const fn undefined_table(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.undefined
    }
}
