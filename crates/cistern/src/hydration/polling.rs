// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Eager, poll-driven hydration.

use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use cistern_store::{CacheStore, SharedStore, StoreRegistry, TrackedStore};
use tracing::trace;

use crate::sync::{CancelFlag, PollingTask};
use crate::{CacheDataSource, CacheLookupResult, HydrationStrategy, InvalidCacheEntryBehavior};

type InstrumentationCallback = Box<dyn Fn(CacheLookupResult) + Send + Sync>;

/// A hydrator that keeps registered entries fresh from a background worker.
///
/// The first `get` of a key hydrates it from the source and *registers* it;
/// from then on a background task refreshes every registered key once per
/// poll interval, so foreground reads are answered from the store without
/// touching the source. Freshness is defined by the last successful poll;
/// the source's `is_valid` is never consulted. A key leaves the refresh
/// domain only through [`delete`](Self::delete) or [`flush`](Self::flush).
///
/// Reads never block on the background poll: the worker calls the source
/// with no lock held and takes the exclusive lock only to commit, and the
/// same discipline applies to the foreground miss path.
///
/// Each poll pass reports a [`CacheLookupResult`] per key through the
/// instrumentation callback, outside any lock. The callback is for
/// observability only; it must not throw and must not influence behavior.
///
/// Dropping the hydrator signals the worker and joins it. The worker may be
/// inside an in-flight `retrieve`, which is not aborted; consider the
/// upper bound of the injected retrieve operation to be the approximate
/// upper bound for destruction.
///
/// # Examples
///
/// ```
/// use cistern::{CacheDataSource, CacheLookupResult, PollingCacheHydrator};
/// use cistern_store::MemoryStore;
/// use std::time::Duration;
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
/// let cache = PollingCacheHydrator::builder(
///     MemoryStore::new(),
///     Source,
///     Duration::from_millis(50),
/// )
/// .build();
///
/// let (result, value) = cache.get(&"bar".to_string());
/// assert_eq!((result, value.as_str()), (CacheLookupResult::Miss, "BAR"));
/// assert!(cache.keys().contains(&"bar".to_string()));
/// ```
pub struct PollingCacheHydrator<K, V, S, D>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + 'static,
    S: CacheStore<K, V> + Send + Sync + 'static,
    D: CacheDataSource<K, V> + 'static,
{
    core: Arc<PollingCore<K, V, S, D>>,
    task: PollingTask,
}

struct PollingCore<K, V, S, D> {
    store: SharedStore<TrackedStore<K, S>>,
    source: D,
    when_invalid: InvalidCacheEntryBehavior,
    instrument: InstrumentationCallback,
    _value: PhantomData<fn() -> V>,
}

impl<K, V, S, D> PollingCacheHydrator<K, V, S, D>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + 'static,
    S: CacheStore<K, V> + Send + Sync + 'static,
    D: CacheDataSource<K, V> + 'static,
{
    /// Starts building a polling hydrator over a store and source with the
    /// given poll interval.
    pub fn builder(store: S, source: D, poll_interval: Duration) -> PollingCacheHydratorBuilder<K, V, S, D> {
        PollingCacheHydratorBuilder {
            store,
            source,
            poll_interval,
            when_invalid: InvalidCacheEntryBehavior::ReturnNotValid,
            instrument: Box::new(|_| {}),
            _value: PhantomData,
        }
    }

    /// Retrieves the value for a key. A hit is answered from the store
    /// under the shared lock; a miss hydrates from the source, with no
    /// lock held during the source call, and registers the key for
    /// polling.
    pub fn get(&self, key: &K) -> (CacheLookupResult, V) {
        let (found, valid, cached) = {
            let store = self.core.store.read();
            match store.get(key) {
                Some(value) => (true, !store.is_marked_invalid(key), Some(value)),
                None => (false, false, None),
            }
        };

        if found {
            return CacheLookupResult::resolve(
                true,
                valid,
                false,
                self.core.when_invalid,
                cached.unwrap_or_default(),
            );
        }

        // Not registered for polling yet; fetch, which implicitly registers.
        match self.core.try_hydrate(key) {
            Some(value) => {
                CacheLookupResult::resolve(false, false, true, self.core.when_invalid, value)
            }
            None => CacheLookupResult::resolve(
                false,
                false,
                false,
                self.core.when_invalid,
                V::default(),
            ),
        }
    }

    /// Marks the entry for a key invalid. The next poll pass that refreshes
    /// it successfully clears the marker; reads in the meantime report the
    /// entry per the configured [`InvalidCacheEntryBehavior`]. Eventually
    /// consistent with concurrent reads: a read already past its store
    /// fetch observes the state at fetch time.
    pub fn invalidate(&self, key: &K) {
        self.core.store.write().mark_invalid(key.clone());
    }

    /// Removes the entry for a key and unregisters it from polling. A
    /// refresh already in flight for the key commits nothing.
    pub fn delete(&self, key: &K) {
        self.core.store.write().delete(key);
    }

    /// Removes every entry and unregisters every key.
    pub fn flush(&self) {
        self.core.store.write().flush();
    }

    /// Returns a copy of the keys currently registered for polling.
    #[must_use]
    pub fn keys(&self) -> HashSet<K> {
        self.core.store.read().keys()
    }

    /// Updates the poll interval; takes effect on the next wait.
    pub fn set_polling_rate(&self, interval: Duration) {
        self.task.set_polling_rate(interval);
    }
}

impl<K, V, S, D> PollingCore<K, V, S, D>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + 'static,
    S: CacheStore<K, V> + Send + Sync + 'static,
    D: CacheDataSource<K, V> + 'static,
{
    /// Foreground miss path: retrieve with no lock held, then take the
    /// exclusive lock only for the commit. `TrackedStore::set` makes the
    /// commit atomic: value written, key registered, marker cleared.
    fn try_hydrate(&self, key: &K) -> Option<V> {
        let value = self.source.retrieve(key)?;
        self.store.write().set(key.clone(), value.clone());
        Some(value)
    }

    /// One poll pass over a snapshot of the registered keys. Mutations to
    /// the registered set during the pass affect the next pass; the
    /// snapshot is iterated lock-free.
    fn poll(&self, cancel: &CancelFlag) {
        let keys = self.store.read().keys();

        for key in keys {
            if cancel.is_cancelled() {
                trace!("shutdown requested; abandoning poll pass");
                break;
            }

            self.try_refresh(&key);
        }
    }

    fn try_refresh(&self, key: &K) {
        let (registered, was_marked, previous) = {
            let store = self.store.read();
            if store.contains(key) {
                (true, store.is_marked_invalid(key), store.get(key))
            } else {
                (false, false, None)
            }
        };

        let result = if !registered {
            // Deleted since the pass snapshot; don't issue a superfluous
            // retrieve.
            CacheLookupResult::classify(false, false, false, self.when_invalid)
        } else {
            // The optimized fetch path; no lock is held during this call.
            let retrieved = match previous.as_ref() {
                Some(current) => self.source.retrieve_with_current(key, current),
                None => self.source.retrieve(key),
            };

            let mut store = self.store.write();
            // The entry could have been deleted during retrieval; verify
            // the update should still occur before committing.
            let still_registered = store.contains(key);

            match retrieved {
                Some(value) if still_registered => {
                    store.set(key.clone(), value);
                    CacheLookupResult::classify(true, !was_marked, true, self.when_invalid)
                }
                None if still_registered => {
                    // The entry is still in the cache, but the refresh
                    // failed: the value is now stale.
                    store.mark_invalid(key.clone());
                    CacheLookupResult::classify(true, false, false, self.when_invalid)
                }
                // Deleted mid-retrieve; discard the result.
                Some(_) | None => CacheLookupResult::classify(true, false, false, self.when_invalid),
            }
        };

        // The callback runs outside the lock, exactly once per key per pass.
        (self.instrument)(result);
    }
}

impl<K, V, S, D> HydrationStrategy<K, V> for PollingCacheHydrator<K, V, S, D>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + 'static,
    S: CacheStore<K, V> + Send + Sync + 'static,
    D: CacheDataSource<K, V> + 'static,
{
    fn get(&mut self, key: &K) -> (CacheLookupResult, V) {
        PollingCacheHydrator::get(self, key)
    }

    fn invalidate(&mut self, key: &K) {
        PollingCacheHydrator::invalidate(self, key);
    }

    fn delete(&mut self, key: &K) {
        PollingCacheHydrator::delete(self, key);
    }

    fn flush(&mut self) {
        PollingCacheHydrator::flush(self);
    }
}

/// Builder for [`PollingCacheHydrator`].
///
/// `build` spawns the background worker, so it is the last thing to run:
/// the shared state the worker observes is fully initialized before the
/// first poll can fire.
pub struct PollingCacheHydratorBuilder<K, V, S, D> {
    store: S,
    source: D,
    poll_interval: Duration,
    when_invalid: InvalidCacheEntryBehavior,
    instrument: InstrumentationCallback,
    _value: PhantomData<fn() -> (K, V)>,
}

impl<K, V, S, D> PollingCacheHydratorBuilder<K, V, S, D>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Default + Send + 'static,
    S: CacheStore<K, V> + Send + Sync + 'static,
    D: CacheDataSource<K, V> + 'static,
{
    /// Selects what to report when an entry exists but is not valid and no
    /// fresh hydration succeeded.
    #[must_use]
    pub fn when_invalid(mut self, behavior: InvalidCacheEntryBehavior) -> Self {
        self.when_invalid = behavior;
        self
    }

    /// Installs a callback invoked with the classified outcome of every
    /// per-key refresh, once per key per poll pass, outside any lock.
    ///
    /// For observability only. The callback must not panic and must not be
    /// used to influence application behavior.
    #[must_use]
    pub fn instrument<F>(mut self, callback: F) -> Self
    where
        F: Fn(CacheLookupResult) + Send + Sync + 'static,
    {
        self.instrument = Box::new(callback);
        self
    }

    /// Builds the hydrator and starts the background poll.
    #[must_use]
    pub fn build(self) -> PollingCacheHydrator<K, V, S, D> {
        let core = Arc::new(PollingCore {
            store: SharedStore::new(TrackedStore::over(self.store)),
            source: self.source,
            when_invalid: self.when_invalid,
            instrument: self.instrument,
            _value: PhantomData,
        });

        let worker = Arc::clone(&core);
        let task = PollingTask::new(self.poll_interval, move |cancel| worker.poll(cancel));

        PollingCacheHydrator { core, task }
    }
}
