//! Per-instance attribute storage.
//!
//! An [`AttributeStore`] is the plain name → value map behind every
//! instance. It knows nothing about resolvers: precedence between stored
//! values and attached members is decided by the engine.

use crate::name::Name;
use crate::value::Value;
use fxhash::FxHashMap;

/// Name → value storage owned by one instance.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    values: FxHashMap<Name, Value>,
}

impl AttributeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the stored value.
    #[must_use]
    pub fn get(&self, name: Name) -> Option<Value> {
        self.values.get(&name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: Name) -> bool {
        self.values.contains_key(&name)
    }

    /// Stores `value`, returning the previous value if any.
    pub fn insert(&mut self, name: Name, value: Value) -> Option<Value> {
        self.values.insert(name, value)
    }

    /// Removes the entry, returning it if it existed.
    pub fn remove(&mut self, name: Name) -> Option<Value> {
        self.values.remove(&name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored names, sorted for stable output.
    #[must_use]
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.values.keys().copied().collect();
        names.sort();
        names
    }

    /// All entries, sorted by name.
    #[must_use]
    pub fn entries(&self) -> Vec<(Name, Value)> {
        let mut entries: Vec<(Name, Value)> = self
            .values
            .iter()
            .map(|(&name, value)| (name, value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
