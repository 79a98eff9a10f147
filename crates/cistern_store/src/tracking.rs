// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The key-tracking decorator.

use std::collections::HashSet;
use std::hash::Hash;

use crate::{CacheStore, StoreRegistry, ValidityOverrideStore};

/// The canonical composite store a polling hydrator operates on: a key
/// tracker over a validity overrider over any base store. Implements
/// [`StoreRegistry`] in full.
pub type TrackedStore<K, S> = KeyTrackingStore<K, ValidityOverrideStore<K, S>>;

/// Wraps a store and records the set of keys written through it.
///
/// The tracked set is the domain a background refresher iterates over:
/// `set` registers a key, `delete` unregisters it, `flush` clears the set.
/// [`keys`](StoreRegistry::keys) hands out a copy so the caller can walk the
/// set without holding a lock on the store.
pub struct KeyTrackingStore<K, S> {
    inner: S,
    keys: HashSet<K>,
}

impl<K, S> KeyTrackingStore<K, S>
where
    K: Eq + Hash,
{
    /// Wraps the given store.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            keys: HashSet::new(),
        }
    }

    /// Returns a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<K, S> TrackedStore<K, S>
where
    K: Eq + Hash,
{
    /// Builds the canonical tracked composite over a base store.
    pub fn over(store: S) -> Self {
        KeyTrackingStore::new(ValidityOverrideStore::new(store))
    }
}

impl<K, V, S> CacheStore<K, V> for KeyTrackingStore<K, S>
where
    K: Eq + Hash + Clone,
    S: CacheStore<K, V>,
{
    fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    fn set(&mut self, key: K, value: V) {
        self.keys.insert(key.clone());
        self.inner.set(key, value);
    }

    fn delete(&mut self, key: &K) -> bool {
        self.keys.remove(key);
        self.inner.delete(key)
    }

    fn flush(&mut self) {
        self.keys.clear();
        self.inner.flush();
    }
}

impl<K, S> StoreRegistry<K> for TrackedStore<K, S>
where
    K: Eq + Hash,
{
    fn keys(&self) -> HashSet<K>
    where
        K: Clone,
    {
        self.keys.clone()
    }

    fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    fn mark_invalid(&mut self, key: K) {
        self.inner.mark_invalid(key);
    }

    fn is_marked_invalid(&self, key: &K) -> bool {
        self.inner.is_marked_invalid(key)
    }
}
