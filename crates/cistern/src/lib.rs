// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A programmable, in-process managed cache.
//!
//! `cistern` composes three orthogonal strategies into one value-retrieval
//! pipeline:
//!
//! - a **store** decides where entries live
//!   ([`MemoryStore`], the discrete-file stores, or your own
//!   [`CacheStore`]);
//! - a **hydration strategy** decides how entries are populated and kept
//!   fresh from the authoritative source ([`PullCacheHydrator`] validates
//!   on every read, [`PollingCacheHydrator`] refreshes registered keys
//!   from a background worker);
//! - a **replacement strategy** decides which entries are evicted under
//!   capacity pressure ([`LeastRecentlyUsed`], or [`NoReplacement`] for
//!   unbounded caches).
//!
//! Every read reports not just the value but *why* that value was returned,
//! as a [`CacheLookupResult`]: hit, miss, refresh, stale, not-found, or
//! not-valid.
//!
//! # Example
//!
//! ```
//! use cistern::{CacheDataSource, CacheLookupResult, ManagedCache, PullCacheHydrator};
//! use cistern_store::MemoryStore;
//!
//! struct Config;
//!
//! impl CacheDataSource<String, String> for Config {
//!     fn retrieve(&self, key: &String) -> Option<String> {
//!         (key == "endpoint").then(|| "https://example.test".to_string())
//!     }
//!
//!     fn is_valid(&self, _key: &String, _value: &String) -> bool {
//!         true
//!     }
//! }
//!
//! let mut cache = ManagedCache::from_hydrator(
//!     PullCacheHydrator::new(MemoryStore::new(), Config),
//! );
//!
//! let (result, value) = cache.get(&"endpoint".to_string());
//! assert_eq!(result, CacheLookupResult::Miss);
//! assert_eq!(value, "https://example.test");
//!
//! let (result, _) = cache.get(&"endpoint".to_string());
//! assert_eq!(result, CacheLookupResult::Hit);
//! ```
//!
//! # Failure model
//!
//! The pipeline has no exceptional control flow. Source absence and source
//! failure are indistinguishable (`None` from the source), store read
//! failures degrade to misses, and every outcome a caller can act on is
//! encoded in the [`CacheLookupResult`].

mod hydration;
mod lookup;
mod managed;
mod replacement;
mod source;
pub mod sync;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use hydration::{
    HydrationStrategy, PollingCacheHydrator, PollingCacheHydratorBuilder, PullCacheHydrator,
};
pub use lookup::{CacheLookupResult, InvalidCacheEntryBehavior};
pub use managed::{ManagedCache, PurgableCache};
pub use replacement::{LeastRecentlyUsed, NoReplacement, ReplacementStrategy};
pub use source::CacheDataSource;

pub use cistern_store::{CacheStore, MemoryStore, StoreRegistry};
