// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The user-facing cache façades.

use std::marker::PhantomData;

use crate::{CacheLookupResult, HydrationStrategy, NoReplacement, ReplacementStrategy};

/// A cache whose contents are managed entirely by its strategies.
///
/// The façade exposes only retrieval and a full flush; everything else
/// (population, refresh, eviction) is the business of the composed
/// strategies. Use [`PurgableCache`] when the caller needs per-entry
/// control.
///
/// # Examples
///
/// ```
/// use cistern::{CacheDataSource, CacheLookupResult, ManagedCache, PullCacheHydrator};
/// use cistern_store::MemoryStore;
///
/// struct Source;
///
/// impl CacheDataSource<String, String> for Source {
///     fn retrieve(&self, key: &String) -> Option<String> {
///         Some(key.to_uppercase())
///     }
///
///     fn is_valid(&self, _key: &String, _value: &String) -> bool {
///         true
///     }
/// }
///
/// let mut cache = ManagedCache::from_hydrator(
///     PullCacheHydrator::new(MemoryStore::new(), Source),
/// );
///
/// let (result, value) = cache.get(&"bar".to_string());
/// assert_eq!((result, value.as_str()), (CacheLookupResult::Miss, "BAR"));
/// ```
pub struct ManagedCache<K, V, R> {
    replacement: R,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, R> ManagedCache<K, V, R>
where
    R: ReplacementStrategy<K, V>,
{
    /// Builds the cache over a replacement strategy.
    pub fn new(replacement: R) -> Self {
        Self {
            replacement,
            _marker: PhantomData,
        }
    }

    /// Retrieves the value for a key, reporting why that value was
    /// returned.
    pub fn get(&mut self, key: &K) -> (CacheLookupResult, V) {
        self.replacement.get(key)
    }

    /// Removes every entry.
    pub fn flush(&mut self) {
        self.replacement.flush();
    }
}

impl<K, V, H> ManagedCache<K, V, NoReplacement<K, V, H>>
where
    H: HydrationStrategy<K, V>,
{
    /// Builds an unbounded cache straight from a hydrator.
    pub fn from_hydrator(hydrator: H) -> Self {
        Self::new(NoReplacement::new(hydrator))
    }
}

/// A [`ManagedCache`] that additionally grants per-entry control.
///
/// The extra operations exist for integrators that own their invalidation
/// signals (a config push, a webhook) rather than leaving freshness
/// entirely to the strategies.
pub struct PurgableCache<K, V, R> {
    replacement: R,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, R> PurgableCache<K, V, R>
where
    R: ReplacementStrategy<K, V>,
{
    /// Builds the cache over a replacement strategy.
    pub fn new(replacement: R) -> Self {
        Self {
            replacement,
            _marker: PhantomData,
        }
    }

    /// Retrieves the value for a key, reporting why that value was
    /// returned.
    pub fn get(&mut self, key: &K) -> (CacheLookupResult, V) {
        self.replacement.get(key)
    }

    /// Removes every entry.
    pub fn flush(&mut self) {
        self.replacement.flush();
    }

    /// Removes the entry for a key.
    pub fn evict(&mut self, key: &K) {
        self.replacement.delete(key);
    }

    /// Evicts the entry for a key, then reloads it from the source.
    pub fn replace(&mut self, key: &K) -> (CacheLookupResult, V) {
        self.replacement.delete(key);
        self.replacement.get(key)
    }

    /// Invalidates the entry for a key, then reloads it.
    pub fn refresh(&mut self, key: &K) -> (CacheLookupResult, V) {
        self.replacement.invalidate(key);
        self.replacement.get(key)
    }

    /// Marks the entry for a key invalid without touching its value.
    pub fn invalidate(&mut self, key: &K) {
        self.replacement.invalidate(key);
    }
}

impl<K, V, H> PurgableCache<K, V, NoReplacement<K, V, H>>
where
    H: HydrationStrategy<K, V>,
{
    /// Builds an unbounded cache straight from a hydrator.
    pub fn from_hydrator(hydrator: H) -> Self {
        Self::new(NoReplacement::new(hydrator))
    }
}
