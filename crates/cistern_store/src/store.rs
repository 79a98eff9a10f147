// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The capability traits cache components compose over.

use std::collections::HashSet;
use std::hash::Hash;

/// Plain key/value storage.
///
/// Implement this trait to provide a storage backend. The cache system
/// wraps implementations in decorators ([`KeyTrackingStore`],
/// [`ValidityOverrideStore`]) and a [`SharedStore`] lock to build the
/// composite a hydrator operates on.
///
/// Absence and failure are deliberately indistinguishable: `get` returns
/// `None` both when the backend has no entry and when it failed to produce
/// one, and write failures are tolerated silently. Backends that need
/// richer failure semantics should wrap this trait rather than extend it.
///
/// [`KeyTrackingStore`]: crate::KeyTrackingStore
/// [`ValidityOverrideStore`]: crate::ValidityOverrideStore
/// [`SharedStore`]: crate::SharedStore
pub trait CacheStore<K, V> {
    /// Gets the value for a key, or `None` if the store has no usable entry.
    fn get(&self, key: &K) -> Option<V>;

    /// Inserts or replaces the value for a key.
    fn set(&mut self, key: K, value: V);

    /// Removes the entry for a key, returning whether an entry was removed.
    fn delete(&mut self, key: &K) -> bool;

    /// Removes every entry.
    fn flush(&mut self);
}

/// The bookkeeping a hydrator keeps next to a store: which keys are
/// registered for refresh, and which entries are marked invalid out of band.
///
/// The invalid marker is orthogonal to entry existence: a stale entry stays
/// readable while marked, and the marker is cleared whenever a fresh value
/// is written or the entry is removed.
pub trait StoreRegistry<K> {
    /// Returns a copy of the registered key set, so callers can iterate
    /// without holding a lock on the store.
    fn keys(&self) -> HashSet<K>
    where
        K: Eq + Hash + Clone;

    /// Returns true if the key is registered.
    fn contains(&self, key: &K) -> bool;

    /// Marks the entry for a key invalid, overriding any other freshness
    /// signal until the next successful write.
    fn mark_invalid(&mut self, key: K);

    /// Returns true if the entry for a key is currently marked invalid.
    fn is_marked_invalid(&self, key: &K) -> bool;
}
