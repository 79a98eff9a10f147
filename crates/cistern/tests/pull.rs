// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Behavioral tests for the pull hydrator.

use cistern::testing::MockDataSource;
use cistern::{CacheLookupResult, InvalidCacheEntryBehavior, PullCacheHydrator};
use cistern_store::MemoryStore;

type PullCache = PullCacheHydrator<
    String,
    String,
    MemoryStore<String, String>,
    MockDataSource<String, String>,
>;

fn cache_over(source: &MockDataSource<String, String>) -> PullCache {
    PullCacheHydrator::new(MemoryStore::new(), source.clone())
}

#[test]
fn first_get_misses_then_hits() {
    let source = MockDataSource::new();
    source.insert("bar".to_string(), "bar".to_string());

    let mut cache = cache_over(&source);

    let (result, value) = cache.get(&"bar".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
    assert_eq!(value, "bar");

    let (result, value) = cache.get(&"bar".to_string());
    assert_eq!(result, CacheLookupResult::Hit);
    assert_eq!(value, "bar");

    // The hit was answered without going back to the source.
    assert_eq!(source.retrieve_count(), 1);
}

#[test]
fn source_that_rejects_its_own_value_forces_refresh() {
    let source = MockDataSource::new();
    source.insert("foo".to_string(), "foo".to_string());
    source.valid_when(|key, _value| key != "foo");

    let mut cache = cache_over(&source);

    let (result, value) = cache.get(&"foo".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
    assert_eq!(value, "foo");

    // Store hit, invalid per the source, rehydration succeeds.
    let (result, value) = cache.get(&"foo".to_string());
    assert_eq!(result, CacheLookupResult::Refresh);
    assert_eq!(value, "foo");
}

#[test]
fn absent_key_reports_not_found_with_sentinel() {
    let source = MockDataSource::<String, String>::new();

    let mut cache = cache_over(&source);

    let (result, value) = cache.get(&"x".to_string());
    assert_eq!(result, CacheLookupResult::NotFound);
    assert_eq!(value, String::default());
}

#[test]
fn failed_hydration_is_not_cached() {
    let source = MockDataSource::<String, String>::new();

    let mut cache = cache_over(&source);

    cache.get(&"x".to_string());
    cache.get(&"x".to_string());

    // No negative caching: every miss goes back to the source.
    assert_eq!(source.retrieve_count(), 2);
}

#[test]
fn invalidate_forces_a_retrieve_despite_source_validity() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let mut cache = cache_over(&source);

    cache.get(&"k".to_string());
    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Hit);
    assert_eq!(source.retrieve_count(), 1);

    cache.invalidate(&"k".to_string());

    // The source still says the entry is valid, but the override wins.
    let (_, value) = cache.get(&"k".to_string());
    assert_eq!(value, "v");
    assert_eq!(source.retrieve_count(), 2);

    // A successful rehydration clears the override.
    cache.get(&"k".to_string());
    assert_eq!(source.retrieve_count(), 2);
}

#[test]
fn unrefreshable_entry_is_withheld_by_default() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "cached".to_string());

    let mut cache = cache_over(&source);
    cache.get(&"k".to_string());

    source.valid_when(|_key, _value| false);
    source.fail_when(|_key| true);

    let (result, value) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::NotValid);
    assert_eq!(value, String::default());
}

#[test]
fn unrefreshable_entry_is_served_under_return_stale() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "cached".to_string());

    let mut cache = cache_over(&source).when_invalid(InvalidCacheEntryBehavior::ReturnStale);
    cache.get(&"k".to_string());

    source.valid_when(|_key, _value| false);
    source.fail_when(|_key| true);

    let (result, value) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Stale);
    assert_eq!(value, "cached");
}

#[test]
fn failed_refresh_leaves_the_stale_value_in_place() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "original".to_string());

    let mut cache = cache_over(&source).when_invalid(InvalidCacheEntryBehavior::ReturnStale);
    cache.get(&"k".to_string());

    source.valid_when(|_key, _value| false);
    source.fail_when(|_key| true);
    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Stale);

    // Once the source recovers, the stale entry refreshes in place.
    source.fail_when(|_key| false);
    source.insert("k".to_string(), "updated".to_string());

    let (result, value) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Refresh);
    assert_eq!(value, "updated");
}

#[test]
fn delete_clears_entry_and_override() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let mut cache = cache_over(&source);
    cache.get(&"k".to_string());
    cache.invalidate(&"k".to_string());
    cache.delete(&"k".to_string());

    // Fresh miss, not a refresh of a marked entry.
    let (result, _) = cache.get(&"k".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
}

#[test]
fn flush_resets_the_cache() {
    let source = MockDataSource::new();
    source.insert("a".to_string(), "1".to_string());
    source.insert("b".to_string(), "2".to_string());

    let mut cache = cache_over(&source);
    cache.get(&"a".to_string());
    cache.get(&"b".to_string());
    cache.flush();

    let (result, _) = cache.get(&"a".to_string());
    assert_eq!(result, CacheLookupResult::Miss);
}

#[test]
fn repeated_hits_are_idempotent() {
    let source = MockDataSource::new();
    source.insert("k".to_string(), "v".to_string());

    let mut cache = cache_over(&source);
    cache.get(&"k".to_string());

    for _ in 0..10 {
        let (result, value) = cache.get(&"k".to_string());
        assert_eq!(result, CacheLookupResult::Hit);
        assert_eq!(value, "v");
    }
}
