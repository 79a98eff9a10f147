// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory storage backend.

use std::collections::HashMap;
use std::hash::Hash;

use crate::CacheStore;

/// A `HashMap` behind the [`CacheStore`] trait.
///
/// The store itself is unsynchronized; the composite lock layered above it
/// (see [`SharedStore`](crate::SharedStore)) provides thread safety, so
/// there is no second layer of locking to pay for on every operation.
///
/// # Examples
///
/// ```
/// use cistern_store::{CacheStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.set("key".to_string(), 42);
/// assert_eq!(store.get(&"key".to_string()), Some(42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore<K, V> {
    data: HashMap<K, V>,
}

impl<K, V> MemoryStore<K, V> {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    /// Creates a store pre-sized for the expected number of entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entries currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> CacheStore<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: K, value: V) {
        self.data.insert(key, value);
    }

    fn delete(&mut self, key: &K) -> bool {
        self.data.remove(key).is_some()
    }

    fn flush(&mut self) {
        self.data.clear();
    }
}
