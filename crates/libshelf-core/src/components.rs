//! Named components: user-defined groups of libraries.
//!
//! Membership is stored explicitly per component. The library → component
//! reverse index is derived on demand and dropped on every membership
//! change, so a query always reflects the latest `set_members` call.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::library::canonical_name;

/// Component membership plus a lazily rebuilt reverse index.
#[derive(Debug, Clone, Default)]
pub struct Components {
    members: BTreeMap<String, BTreeSet<String>>,
    owners: OnceCell<HashMap<String, String>>,
}

impl Components {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the membership of `name` wholesale.
    pub fn set_members<I, S>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        debug!(component = name, count = members.len(), "component membership replaced");
        self.members.insert(name.to_string(), members);
        self.invalidate();
    }

    /// Delete a component. Returns its former members.
    pub fn remove(&mut self, name: &str) -> Option<BTreeSet<String>> {
        let removed = self.members.remove(name);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// Remove one library from every component that lists it.
    pub fn drop_member(&mut self, library: &str) {
        let key = canonical_name(library);
        let mut changed = false;
        for members in self.members.values_mut() {
            let before = members.len();
            members.retain(|m| canonical_name(m) != key);
            changed |= members.len() != before;
        }
        if changed {
            self.invalidate();
        }
    }

    #[must_use]
    pub fn is_component(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    #[must_use]
    pub fn members_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.members.get(name)
    }

    /// Component owning `library`, looked up by canonical identifier.
    ///
    /// When several components list the same library the lexicographically
    /// last component name wins.
    #[must_use]
    pub fn owner_of(&self, library: &str) -> Option<&str> {
        self.owners
            .get_or_init(|| self.build_reverse_index())
            .get(&canonical_name(library))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.members.iter().map(|(name, libs)| (name.as_str(), libs))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn invalidate(&mut self) {
        self.owners = OnceCell::new();
    }

    fn build_reverse_index(&self) -> HashMap<String, String> {
        debug!(components = self.members.len(), "rebuilding component reverse index");
        let mut owners = HashMap::new();
        for (component, libs) in &self.members {
            for lib in libs {
                owners.insert(canonical_name(lib), component.clone());
            }
        }
        owners
    }
}
