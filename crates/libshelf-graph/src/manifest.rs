//! Package manifests: per-node library lists and requirements.
//!
//! # Overview
//!
//! A manifest has one [`ManifestEntry`] per graph node that a package
//! recipe must declare:
//!
//! - a **component** node lists its member libraries;
//! - a **non-system library** node lists itself;
//! - **system libraries** get no entry of their own. They show up only in
//!   the `system_requires` of the nodes that need them.
//!
//! ## Naming
//!
//! Entries and requirements use canonical library names (`libfoo.so` →
//! `foo`). A library whose canonical name collides with a package name is
//! prefixed with `_`, since recipe components and packages share one
//! namespace. Component names are kept unchanged.
//!
//! ## Order
//!
//! Entries follow the wave order of the graph; nodes that sit on a cycle are
//! appended at the end in lexicographic order.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use libshelf_core::Catalog;
use libshelf_core::library::canonical_name;
use serde::Serialize;

use crate::graph::depgraph::DepGraph;
use crate::graph::topo::waves;

/// Declaration of one recipe component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Component name as it appears in the recipe.
    pub name: String,
    /// Canonical names of the libraries the component ships.
    pub libs: Vec<String>,
    /// Other recipe components this one requires.
    pub requires: Vec<String>,
    /// System libraries this one links against.
    pub system_requires: Vec<String>,
}

/// Derive the manifest for every node of `graph`.
#[must_use]
pub fn build_manifest(catalog: &Catalog, graph: &DepGraph) -> Vec<ManifestEntry> {
    let order = waves(graph);
    order
        .order()
        .iter()
        .chain(order.omitted.iter())
        .filter_map(|id| entry_for(catalog, graph, id))
        .collect()
}

fn entry_for(catalog: &Catalog, graph: &DepGraph, id: &str) -> Option<ManifestEntry> {
    let (name, libs, members) = if catalog.is_component(id) {
        let members = catalog.component_members(id);
        let libs = members.iter().map(|m| canonical_name(m)).collect();
        (id.to_string(), libs, members)
    } else {
        let lib = catalog.get_library(id)?;
        if lib.system {
            return None;
        }
        (
            recipe_name(catalog, id),
            vec![lib.name().to_string()],
            BTreeSet::new(),
        )
    };

    let deps: Vec<String> = graph
        .successors(id)
        .filter(|dep| !members.contains(*dep))
        .map(str::to_string)
        .collect();
    let requires: BTreeSet<String> = catalog
        .filter_system(&deps, false)
        .iter()
        .map(|dep| recipe_name(catalog, dep))
        .collect();
    let system_requires: BTreeSet<String> = catalog
        .filter_system(&deps, true)
        .iter()
        .map(|dep| canonical_name(dep))
        .collect();

    Some(ManifestEntry {
        name,
        libs,
        requires: requires.into_iter().collect(),
        system_requires: system_requires.into_iter().collect(),
    })
}

/// Recipe-level name of a graph node.
fn recipe_name(catalog: &Catalog, id: &str) -> String {
    if catalog.is_component(id) {
        return id.to_string();
    }
    let stripped = canonical_name(id);
    if catalog.is_package(&stripped) {
        format!("_{stripped}")
    } else {
        stripped
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render `entries` as the `package_info` method of a Conan recipe.
///
/// `indent` is the unit of indentation (a tab or a run of spaces).
#[must_use]
pub fn render_conan(entries: &[ManifestEntry], indent: &str) -> String {
    let mut out = String::new();
    out.push_str("from conan import ConanFile\n");
    out.push_str("class Template(ConanFile):\n");
    let _ = writeln!(out, "{indent}def package_info(self):");

    let body = indent.repeat(2);
    for entry in entries {
        let component = format!("self.cpp_info.components[\"{}\"]", entry.name);
        let _ = writeln!(out, "{body}{component}.libs = [{}]", quoted(&entry.libs));
        write_list(&mut out, &body, indent, &format!("{component}.requires"), &entry.requires);
        write_list(
            &mut out,
            &body,
            indent,
            &format!("{component}.system_libs"),
            &entry.system_requires,
        );
        out.push('\n');
    }
    out
}

fn write_list(out: &mut String, body: &str, indent: &str, target: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{body}{target}.extend([");
    for item in items {
        let _ = writeln!(out, "{body}{indent}\"{item}\",");
    }
    let _ = writeln!(out, "{body}])");
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
