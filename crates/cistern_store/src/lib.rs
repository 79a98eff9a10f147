// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Storage capability traits and built-in stores for the cistern cache.
//!
//! This crate defines the two capability traits the cache system composes
//! over, [`CacheStore`] for plain key/value storage and [`StoreRegistry`]
//! for the bookkeeping a hydrator layers on top (registered keys and
//! per-key invalid markers), along with the built-in backends and
//! decorators:
//!
//! - [`MemoryStore`]: a `HashMap` behind the storage trait.
//! - [`DiscreteFileStoreVolatile`] / [`DiscreteFileStoreNonVolatile`]:
//!   one file per entry, with pluggable serialization via [`FileCodec`].
//! - [`ValidityOverrideStore`]: adds an out-of-band "invalid" marker per key,
//!   independent of whether the entry itself still exists.
//! - [`KeyTrackingStore`]: tracks the set of keys that have passed through
//!   `set`, so a background refresher knows what to iterate.
//! - [`SharedStore`]: the single reader-writer lock wrapped around a
//!   composite store, exposing access only through lock-scoped guards.
//!
//! # Composition
//!
//! Decorators compose by value; the canonical stack used by the polling
//! hydrator is [`TrackedStore`], a key tracker over a validity overrider
//! over any base store:
//!
//! ```
//! use cistern_store::{CacheStore, MemoryStore, StoreRegistry, TrackedStore};
//!
//! let mut store = TrackedStore::over(MemoryStore::new());
//! store.set("fleet".to_string(), 12u32);
//!
//! assert!(store.contains(&"fleet".to_string()));
//! assert!(!store.is_marked_invalid(&"fleet".to_string()));
//! ```

pub mod discrete_files;
pub mod error;
pub mod memory;
mod shared;
mod store;
mod tracking;
mod validity;

pub use discrete_files::{
    BincodeCodec, DiscreteFileStoreNonVolatile, DiscreteFileStoreNonVolatileBincode,
    DiscreteFileStoreNonVolatileJson, DiscreteFileStoreVolatile, DiscreteFileStoreVolatileBincode,
    DiscreteFileStoreVolatileJson, FileCodec, JsonCodec, Record,
};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use shared::SharedStore;
pub use store::{CacheStore, StoreRegistry};
pub use tracking::{KeyTrackingStore, TrackedStore};
pub use validity::ValidityOverrideStore;
