//! Map keyed by an ordered pair of values.
//!
//! Supports point lookups on the full pair and presence checks on either half.
//! The half-key queries are linear scans; the maps built here hold tens of
//! entries, not thousands.

use crate::error::RegistryError;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Associative container keyed by `(K1, K2)`.
///
/// Inserting a pair that is already present is an error, never an overwrite.
#[derive(Debug, Clone)]
pub struct CompositeKeyMap<K1, K2, V> {
    entries: BTreeMap<(K1, K2), V>,
}

impl<K1, K2, V> CompositeKeyMap<K1, K2, V>
where
    K1: Ord + Clone + Display,
    K2: Ord + Clone + Display,
{
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert a value under `(first, second)`.
    ///
    /// Fails with [`RegistryError::DuplicateKey`] and leaves the map
    /// untouched if the pair is already present.
    pub fn insert(&mut self, first: K1, second: K2, value: V) -> Result<(), RegistryError> {
        let key = (first, second);
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateKey {
                first: key.0.to_string(),
                second: key.1.to_string(),
            });
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Look up the value stored under the exact pair.
    pub fn get(&self, first: &K1, second: &K2) -> Result<&V, RegistryError> {
        // BTreeMap lookups need an owned tuple for the borrowed key form.
        self.entries
            .get(&(first.clone(), second.clone()))
            .ok_or_else(|| RegistryError::KeyNotFound {
                first: first.to_string(),
                second: second.to_string(),
            })
    }

    pub fn contains_pair(&self, first: &K1, second: &K2) -> bool {
        self.entries.contains_key(&(first.clone(), second.clone()))
    }

    /// True if any stored pair has `first` as its first component.
    pub fn contains_first(&self, first: &K1) -> bool {
        self.entries.keys().any(|(k1, _)| k1 == first)
    }

    /// True if any stored pair has `second` as its second component.
    pub fn contains_second(&self, second: &K2) -> bool {
        self.entries.keys().any(|(_, k2)| k2 == second)
    }

    /// Values whose first key component equals `first`, in key order.
    ///
    /// The returned iterator is lazy and can be cloned to restart it.
    pub fn values_for_first<'a>(
        &'a self,
        first: &'a K1,
    ) -> impl Iterator<Item = &'a V> + Clone + 'a {
        self.entries
            .iter()
            .filter(move |((k1, _), _)| k1 == first)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K1, &K2, &V)> {
        self.entries.iter().map(|((k1, k2), v)| (k1, k2, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K1, K2, V> Default for CompositeKeyMap<K1, K2, V>
where
    K1: Ord + Clone + Display,
    K2: Ord + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}
