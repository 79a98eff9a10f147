// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lazy, read-driven hydration.

use std::hash::Hash;
use std::marker::PhantomData;

use cistern_store::{CacheStore, ValidityOverrideStore};
use tracing::trace;

use crate::{CacheDataSource, CacheLookupResult, HydrationStrategy, InvalidCacheEntryBehavior};

/// A hydrator that validates and rehydrates on every read.
///
/// On `get`, a cached entry is kept if the source still vouches for it
/// ([`CacheDataSource::is_valid`]) and it hasn't been marked invalid by
/// [`invalidate`](Self::invalidate); otherwise the hydrator rehydrates in
/// line, handing the source the current value so a 304-style optimized
/// fetch can reuse it. A failed rehydration leaves the stale entry in
/// place; whether the caller sees it depends on the
/// [`InvalidCacheEntryBehavior`] chosen at construction.
///
/// # Examples
///
/// ```
/// use cistern::{CacheDataSource, CacheLookupResult, PullCacheHydrator};
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
/// let mut cache = PullCacheHydrator::new(MemoryStore::new(), Source);
///
/// let (result, value) = cache.get(&"bar".to_string());
/// assert_eq!((result, value.as_str()), (CacheLookupResult::Miss, "BAR"));
///
/// let (result, value) = cache.get(&"bar".to_string());
/// assert_eq!((result, value.as_str()), (CacheLookupResult::Hit, "BAR"));
/// ```
pub struct PullCacheHydrator<K, V, S, D> {
    store: ValidityOverrideStore<K, S>,
    source: D,
    when_invalid: InvalidCacheEntryBehavior,
    _value: PhantomData<fn() -> V>,
}

impl<K, V, S, D> PullCacheHydrator<K, V, S, D>
where
    K: Eq + Hash + Clone,
    V: Clone + Default,
    S: CacheStore<K, V>,
    D: CacheDataSource<K, V>,
{
    /// Creates a pull hydrator over a store and source, reporting
    /// `NotValid` for entries that exist but could not be made fresh.
    pub fn new(store: S, source: D) -> Self {
        Self {
            store: ValidityOverrideStore::new(store),
            source,
            when_invalid: InvalidCacheEntryBehavior::ReturnNotValid,
            _value: PhantomData,
        }
    }

    /// Selects what to report when an entry exists but is not valid and no
    /// fresh hydration succeeded.
    #[must_use]
    pub fn when_invalid(mut self, behavior: InvalidCacheEntryBehavior) -> Self {
        self.when_invalid = behavior;
        self
    }

    /// Retrieves the value for a key, rehydrating if the cached entry is
    /// absent, rejected by the source, or marked invalid.
    pub fn get(&mut self, key: &K) -> (CacheLookupResult, V) {
        let mut hydrated = false;
        let mut valid = false;

        match self.store.get(key) {
            Some(mut datum) => {
                valid = self.source.is_valid(key, &datum);

                if !valid || self.store.is_marked_invalid(key) {
                    if let Some(fresh) = self.try_hydrate(key, Some(&datum)) {
                        hydrated = true;
                        datum = fresh;
                    }
                }

                CacheLookupResult::resolve(true, valid, hydrated, self.when_invalid, datum)
            }
            None => {
                let datum = match self.try_hydrate(key, None) {
                    Some(fresh) => {
                        hydrated = true;
                        fresh
                    }
                    None => V::default(),
                };

                CacheLookupResult::resolve(false, valid, hydrated, self.when_invalid, datum)
            }
        }
    }

    /// Marks the entry for a key invalid, forcing the next read to
    /// rehydrate regardless of what the source says about validity.
    pub fn invalidate(&mut self, key: &K) {
        self.store.mark_invalid(key.clone());
    }

    /// Removes the entry for a key, clearing its invalid marker with it.
    pub fn delete(&mut self, key: &K) {
        self.store.delete(key);
    }

    /// Removes every entry and marker.
    pub fn flush(&mut self) {
        self.store.flush();
    }

    /// Fetches from the source and commits on success. A committed write
    /// clears the invalid marker; a failure touches nothing, leaving any
    /// stale entry (and its marker) as they were.
    fn try_hydrate(&mut self, key: &K, current: Option<&V>) -> Option<V> {
        let retrieved = match current {
            Some(current) => self.source.retrieve_with_current(key, current),
            None => self.source.retrieve(key),
        };

        match retrieved {
            Some(value) => {
                self.store.set(key.clone(), value.clone());
                Some(value)
            }
            None => {
                trace!("hydration failed; leaving store untouched");
                None
            }
        }
    }
}

impl<K, V, S, D> HydrationStrategy<K, V> for PullCacheHydrator<K, V, S, D>
where
    K: Eq + Hash + Clone,
    V: Clone + Default,
    S: CacheStore<K, V>,
    D: CacheDataSource<K, V>,
{
    fn get(&mut self, key: &K) -> (CacheLookupResult, V) {
        PullCacheHydrator::get(self, key)
    }

    fn invalidate(&mut self, key: &K) {
        PullCacheHydrator::invalidate(self, key);
    }

    fn delete(&mut self, key: &K) {
        PullCacheHydrator::delete(self, key);
    }

    fn flush(&mut self) {
        PullCacheHydrator::flush(self);
    }
}
