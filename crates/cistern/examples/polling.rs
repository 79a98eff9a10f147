// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A polling-hydrated cache with instrumentation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cistern::{CacheDataSource, PollingCacheHydrator};
use cistern_store::MemoryStore;

/// A source whose value changes out from under the cache.
struct Counter(AtomicU64);

impl CacheDataSource<String, u64> for Counter {
    fn retrieve(&self, _key: &String) -> Option<u64> {
        Some(self.0.fetch_add(1, Ordering::Relaxed))
    }

    fn is_valid(&self, _key: &String, _value: &u64) -> bool {
        true
    }
}

fn main() {
    let cache = PollingCacheHydrator::builder(
        MemoryStore::new(),
        Counter(AtomicU64::new(0)),
        Duration::from_millis(200),
    )
    .instrument(|result| println!("poll: {result:?}"))
    .build();

    let key = "ticks".to_string();
    let (result, value) = cache.get(&key);
    println!("get: {result:?} => {value}");

    // Watch the background poll keep the entry fresh.
    for _ in 0..5 {
        std::thread::sleep(Duration::from_millis(300));
        let (result, value) = cache.get(&key);
        println!("get: {result:?} => {value}");
    }
}
