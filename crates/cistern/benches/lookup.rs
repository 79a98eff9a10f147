// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Benchmarks for the hot read paths.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cistern::{
    CacheDataSource, CacheLookupResult, InvalidCacheEntryBehavior, PollingCacheHydrator,
    PullCacheHydrator,
};
use cistern_store::MemoryStore;

/// A source with no bookkeeping, so the measurement is the cache path.
struct StaticSource;

impl CacheDataSource<u64, u64> for StaticSource {
    fn retrieve(&self, key: &u64) -> Option<u64> {
        Some(*key * 2)
    }

    fn is_valid(&self, _key: &u64, _value: &u64) -> bool {
        true
    }
}

fn classify(c: &mut Criterion) {
    c.bench_function("classify", |b| {
        b.iter(|| {
            CacheLookupResult::classify(
                black_box(true),
                black_box(false),
                black_box(true),
                InvalidCacheEntryBehavior::ReturnNotValid,
            )
        });
    });
}

fn pull_hit(c: &mut Criterion) {
    let mut cache = PullCacheHydrator::new(MemoryStore::new(), StaticSource);
    cache.get(&1);

    c.bench_function("pull_hit", |b| {
        b.iter(|| cache.get(black_box(&1)));
    });
}

fn polling_hit(c: &mut Criterion) {
    let cache = PollingCacheHydrator::builder(
        MemoryStore::new(),
        StaticSource,
        Duration::from_secs(3600),
    )
    .build();
    cache.get(&1);

    c.bench_function("polling_hit", |b| {
        b.iter(|| cache.get(black_box(&1)));
    });
}

criterion_group!(benches, classify, pull_hit, polling_hit);
criterion_main!(benches);
