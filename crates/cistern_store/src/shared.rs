// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The synchronized wrapper around a composite store.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A clonable handle to a store guarded by a single reader-writer lock.
///
/// Every composite operation (inner store, invalid markers, registered
/// keys) runs under this one lock, so the invariants tying the three
/// together can be maintained atomically. Access is only possible through
/// the lock-scoped guards returned by [`read`](Self::read) and
/// [`write`](Self::write); there is no way to reach the store unlocked.
///
/// Guards must not be held across a data-source call. The hydrators copy
/// what they need out of the store, drop the guard, call the source, and
/// re-acquire for the commit.
pub struct SharedStore<S> {
    inner: Arc<RwLock<S>>,
}

impl<S> SharedStore<S> {
    /// Wraps a store in the shared lock.
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Acquires the shared lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, S> {
        self.inner.read()
    }

    /// Acquires the exclusive lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.inner.write()
    }
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheStore, MemoryStore};
    use std::thread;

    #[test]
    fn writes_are_visible_to_other_handles() {
        let store = SharedStore::new(MemoryStore::new());
        let clone = store.clone();

        clone.write().set("a", 1);
        assert_eq!(store.read().get(&"a"), Some(1));
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let store = SharedStore::new(MemoryStore::new());
        store.write().set("seed".to_string(), 0u64);

        thread::scope(|scope| {
            for _ in 0..4 {
                let handle = store.clone();
                scope.spawn(move || {
                    for _ in 0..1000 {
                        let _ = handle.read().get(&"seed".to_string());
                    }
                });
            }

            let writer = store.clone();
            scope.spawn(move || {
                for i in 0..1000u64 {
                    writer.write().set("seed".to_string(), i);
                }
            });
        });

        assert_eq!(store.read().get(&"seed".to_string()), Some(999));
    }
}
