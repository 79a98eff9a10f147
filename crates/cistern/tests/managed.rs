// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tests for the façades and replacement strategies composed over real
//! hydrators.

use std::time::Duration;

use cistern::testing::MockDataSource;
use cistern::{
    CacheLookupResult, LeastRecentlyUsed, ManagedCache, PollingCacheHydrator, PullCacheHydrator,
    PurgableCache,
};
use cistern_store::MemoryStore;

fn pull_over(
    source: &MockDataSource<String, String>,
) -> PullCacheHydrator<String, String, MemoryStore<String, String>, MockDataSource<String, String>>
{
    PullCacheHydrator::new(MemoryStore::new(), source.clone())
}

#[test]
fn managed_cache_reports_lookup_results() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let mut cache = ManagedCache::from_hydrator(pull_over(&source));

    let (result, value) = cache.get(&"k".to_string());
    assert_eq!((result, value.as_str()), (CacheLookupResult::Miss, "v"));

    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Hit);

    cache.flush();
    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
}

#[test]
fn managed_cache_composes_over_a_polling_hydrator() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let hydrator = PollingCacheHydrator::builder(
        MemoryStore::new(),
        source.clone(),
        Duration::from_secs(3600),
    )
    .build();

    let mut cache = ManagedCache::from_hydrator(hydrator);

    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Hit);
}

#[test]
fn purgable_cache_evicts_on_demand() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let mut cache = PurgableCache::from_hydrator(pull_over(&source));

    cache.get(&"k".to_string());
    cache.evict(&"k".to_string());

    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
}

#[test]
fn purgable_replace_reloads_from_the_source() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "old".to_string());

    let mut cache = PurgableCache::from_hydrator(pull_over(&source));
    cache.get(&"k".to_string());

    source.insert("k".to_string(), "new".to_string());
    let (result, value) = cache.replace(&"k".to_string());

    assert_eq!((result, value.as_str()), (CacheLookupResult::Miss, "new"));
    assert_eq!(source.retrieve_count(), 2);
}

#[test]
fn purgable_refresh_rehydrates_in_place() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "old".to_string());

    let mut cache = PurgableCache::from_hydrator(pull_over(&source));
    cache.get(&"k".to_string());

    source.insert("k".to_string(), "new".to_string());
    let (_, value) = cache.refresh(&"k".to_string());

    assert_eq!(value, "new");
    assert_eq!(source.retrieve_count(), 2);
}

#[test]
fn purgable_invalidate_defers_the_reload_to_the_next_get() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let mut cache = PurgableCache::from_hydrator(pull_over(&source));
    cache.get(&"k".to_string());
    cache.invalidate(&"k".to_string());
    assert_eq!(source.retrieve_count(), 1);

    cache.get(&"k".to_string());
    assert_eq!(source.retrieve_count(), 2);
}

#[test]
fn lru_evicts_the_least_recently_used_entry() {
    let source = MockDataSource::new();
    for key in ["a", "b", "c"] {
        source.insert(key.to_string(), key.to_uppercase());
    }

    let mut cache = ManagedCache::new(LeastRecentlyUsed::new(pull_over(&source), 2));

    cache.get(&"a".to_string());
    cache.get(&"b".to_string());
    cache.get(&"a".to_string()); // a is now most recent
    cache.get(&"c".to_string()); // capacity exceeded: b evicted

    let before = source.retrieve_count();

    let (result, _) = cache.get(&"a".to_string());
    assert_eq!(result, CacheLookupResult::Hit);
    assert_eq!(source.retrieve_count(), before);

    let (result, _) = cache.get(&"b".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
    assert_eq!(source.retrieve_count(), before + 1);
}

#[test]
fn lru_eviction_unregisters_keys_from_a_polling_hydrator() {
    let source = MockDataSource::new();
    for key in ["a", "b", "c"] {
        source.insert(key.to_string(), key.to_uppercase());
    }

    let hydrator = PollingCacheHydrator::builder(
        MemoryStore::new(),
        source.clone(),
        Duration::from_secs(3600),
    )
    .build();

    use cistern::ReplacementStrategy;

    let mut lru = LeastRecentlyUsed::new(hydrator, 2);
    lru.get(&"a".to_string());
    lru.get(&"b".to_string());
    lru.get(&"c".to_string()); // evicts a

    let tracked: Vec<String> = lru.usage_order().cloned().collect();
    assert_eq!(tracked, ["c".to_string(), "b".to_string()]);

    // The evicted key left the refresh domain, not just the store.
    assert!(!lru.hydrator().keys().contains(&"a".to_string()));
    assert!(lru.hydrator().keys().contains(&"b".to_string()));
}
