// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Least-recently-used replacement.

use std::collections::VecDeque;
use std::marker::PhantomData;

use tracing::debug;

use crate::{CacheLookupResult, HydrationStrategy, ReplacementStrategy};

/// Bounds a cache by evicting the least recently used entries.
///
/// Usage order is held in memory only, even over a non-volatile store:
/// persisting it would turn every read into a write on a potentially
/// expensive backend, and preserving the exact order across restarts isn't
/// a real use case. After a restart the order rebuilds as entries are
/// touched.
///
/// Eviction flows through the hydrator's `delete`, so a polling hydrator
/// unregisters evicted keys and stops refreshing them.
pub struct LeastRecentlyUsed<K, V, H> {
    hydrator: H,
    max_entries: usize,
    // Front is most recently used. The population a replacement strategy
    // manages is small by definition, so a scan on touch is fine.
    usage_order: VecDeque<K>,
    _marker: PhantomData<fn() -> V>,
}

impl<K, V, H> LeastRecentlyUsed<K, V, H>
where
    K: Eq + Clone,
    H: HydrationStrategy<K, V>,
{
    /// Wraps a hydrator, keeping at most `max_entries` entries.
    pub fn new(hydrator: H, max_entries: usize) -> Self {
        Self {
            hydrator,
            max_entries,
            usage_order: VecDeque::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the keys currently tracked, most recently used first.
    pub fn usage_order(&self) -> impl Iterator<Item = &K> {
        self.usage_order.iter()
    }

    /// Returns a reference to the wrapped hydrator.
    pub fn hydrator(&self) -> &H {
        &self.hydrator
    }

    fn touch(&mut self, key: &K) {
        if self.usage_order.front() == Some(key) {
            return;
        }

        if let Some(position) = self.usage_order.iter().position(|tracked| tracked == key) {
            self.usage_order.remove(position);
        }

        self.usage_order.push_front(key.clone());
    }

    fn evict_beyond_capacity(&mut self) {
        while self.usage_order.len() > self.max_entries {
            if let Some(evicted) = self.usage_order.pop_back() {
                debug!("capacity exceeded; evicting least recently used entry");
                self.hydrator.delete(&evicted);
            }
        }
    }

    fn forget(&mut self, key: &K) {
        if let Some(position) = self.usage_order.iter().position(|tracked| tracked == key) {
            self.usage_order.remove(position);
        }
    }
}

impl<K, V, H> ReplacementStrategy<K, V> for LeastRecentlyUsed<K, V, H>
where
    K: Eq + Clone,
    H: HydrationStrategy<K, V>,
{
    fn get(&mut self, key: &K) -> (CacheLookupResult, V) {
        let (result, value) = self.hydrator.get(key);

        if result.entry_present() {
            self.touch(key);
            self.evict_beyond_capacity();
        }

        (result, value)
    }

    fn invalidate(&mut self, key: &K) {
        self.hydrator.invalidate(key);
    }

    fn delete(&mut self, key: &K) {
        self.forget(key);
        self.hydrator.delete(key);
    }

    fn flush(&mut self) {
        self.usage_order.clear();
        self.hydrator.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDataSource;
    use crate::PullCacheHydrator;
    use cistern_store::MemoryStore;

    fn lru(
        source: MockDataSource<String, String>,
        max_entries: usize,
    ) -> LeastRecentlyUsed<
        String,
        String,
        PullCacheHydrator<String, String, MemoryStore<String, String>, MockDataSource<String, String>>,
    > {
        LeastRecentlyUsed::new(PullCacheHydrator::new(MemoryStore::new(), source), max_entries)
    }

    #[test]
    fn touch_moves_key_to_front() {
        let source = MockDataSource::new();
        source.insert("a".to_string(), "1".to_string());
        source.insert("b".to_string(), "2".to_string());

        let mut cache = lru(source, 4);
        cache.get(&"a".to_string());
        cache.get(&"b".to_string());
        cache.get(&"a".to_string());

        let order: Vec<_> = cache.usage_order().cloned().collect();
        assert_eq!(order, ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn exceeding_capacity_evicts_the_back() {
        let source = MockDataSource::new();
        for key in ["a", "b", "c"] {
            source.insert(key.to_string(), key.to_uppercase());
        }

        let mut cache = lru(source, 2);
        cache.get(&"a".to_string());
        cache.get(&"b".to_string());
        cache.get(&"c".to_string());

        let order: Vec<_> = cache.usage_order().cloned().collect();
        assert_eq!(order, ["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn missing_keys_are_not_tracked() {
        let source = MockDataSource::<String, String>::new();

        let mut cache = lru(source, 2);
        let (result, _) = cache.get(&"absent".to_string());

        assert_eq!(result, CacheLookupResult::NotFound);
        assert_eq!(cache.usage_order().count(), 0);
    }
}
