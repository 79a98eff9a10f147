// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The validity-override decorator.

use std::collections::HashSet;
use std::hash::Hash;

use crate::CacheStore;

/// Wraps a store with a per-key "invalid" marker that is independent of
/// whether the entry itself exists.
///
/// A hydrator uses the marker to force the next read to rehydrate without
/// evicting the stale value, so best-effort reads can still be served under
/// the `ReturnStale` policy. The marker algebra is:
///
/// - `mark_invalid(k)` sets the marker.
/// - `set(k, _)` and `delete(k)` clear it; a fresh write or a removal both
///   end the entry's invalid state.
/// - `flush()` clears every marker along with every entry.
pub struct ValidityOverrideStore<K, S> {
    inner: S,
    invalid: HashSet<K>,
}

impl<K, S> ValidityOverrideStore<K, S>
where
    K: Eq + Hash,
{
    /// Wraps the given store.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            invalid: HashSet::new(),
        }
    }

    /// Marks the entry for a key invalid until the next write or removal.
    pub fn mark_invalid(&mut self, key: K) {
        self.invalid.insert(key);
    }

    /// Returns true if the entry for a key is currently marked invalid.
    pub fn is_marked_invalid(&self, key: &K) -> bool {
        self.invalid.contains(key)
    }

    /// Returns a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<K, V, S> CacheStore<K, V> for ValidityOverrideStore<K, S>
where
    K: Eq + Hash,
    S: CacheStore<K, V>,
{
    fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    fn set(&mut self, key: K, value: V) {
        self.invalid.remove(&key);
        self.inner.set(key, value);
    }

    fn delete(&mut self, key: &K) -> bool {
        self.invalid.remove(key);
        self.inner.delete(key)
    }

    fn flush(&mut self) {
        self.invalid.clear();
        self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn store() -> ValidityOverrideStore<&'static str, MemoryStore<&'static str, i32>> {
        ValidityOverrideStore::new(MemoryStore::new())
    }

    #[test]
    fn marker_is_independent_of_entry_existence() {
        let mut store = store();
        store.mark_invalid("ghost");
        assert!(store.is_marked_invalid(&"ghost"));
        assert_eq!(store.get(&"ghost"), None);
    }

    #[test]
    fn set_clears_marker() {
        let mut store = store();
        store.set("a", 1);
        store.mark_invalid("a");
        store.set("a", 2);
        assert!(!store.is_marked_invalid(&"a"));
        assert_eq!(store.get(&"a"), Some(2));
    }

    #[test]
    fn delete_clears_marker_and_entry() {
        let mut store = store();
        store.set("a", 1);
        store.mark_invalid("a");
        assert!(store.delete(&"a"));
        assert!(!store.is_marked_invalid(&"a"));
        assert_eq!(store.get(&"a"), None);
    }

    #[test]
    fn flush_clears_markers_and_entries() {
        let mut store = store();
        store.set("a", 1);
        store.set("b", 2);
        store.mark_invalid("a");
        store.flush();
        assert!(!store.is_marked_invalid(&"a"));
        assert_eq!(store.get(&"b"), None);
    }

    #[test]
    fn marked_entry_stays_readable() {
        let mut store = store();
        store.set("a", 1);
        store.mark_invalid("a");
        assert_eq!(store.get(&"a"), Some(1));
    }
}
