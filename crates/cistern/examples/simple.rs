// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A pull-hydrated cache over an in-memory store.

use cistern::{CacheDataSource, ManagedCache, PullCacheHydrator};
use cistern_store::MemoryStore;

/// Stands in for whatever expensive lookup you are fronting.
struct RegionDirectory;

impl CacheDataSource<String, String> for RegionDirectory {
    fn retrieve(&self, key: &String) -> Option<String> {
        match key.as_str() {
            "westus" => Some("wus-gateway-04".to_string()),
            "eastus" => Some("eus-gateway-11".to_string()),
            _ => None,
        }
    }

    fn is_valid(&self, _key: &String, _value: &String) -> bool {
        true
    }
}

fn main() {
    let mut cache = ManagedCache::from_hydrator(PullCacheHydrator::new(
        MemoryStore::new(),
        RegionDirectory,
    ));

    for key in ["westus", "westus", "eastus", "antarctica"] {
        let (result, value) = cache.get(&key.to_string());
        println!("{key}: {result:?} => {value:?}");
    }
}
