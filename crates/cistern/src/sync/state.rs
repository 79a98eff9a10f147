// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Snapshot-swapped shared state.

use std::sync::Arc;

use parking_lot::RwLock;

/// Shared state mutated only by swapping in a complete replacement snapshot.
///
/// Readers take an ephemeral `Arc` snapshot of the current state and operate
/// on it for as long as they like; the writer publishes a new snapshot
/// whenever it pleases. A reader holding an old generation keeps a coherent
/// view until it drops the `Arc`, so multiple generations coexist, and reads
/// during concurrent writes are simply stale, becoming consistent on the
/// next snapshot.
///
/// The swap itself runs under a pointer-sized critical section, so the
/// contention window is a single `Arc` clone rather than however long the
/// reader's work takes. Use this where snapshot-per-read is acceptable and
/// holding a lock for the duration of the work would dominate.
///
/// # Examples
///
/// ```
/// use cistern::sync::EventuallyConsistentSharedState;
/// use std::sync::Arc;
///
/// let state = EventuallyConsistentSharedState::new(vec![1, 2, 3]);
///
/// let snapshot = state.snapshot();
/// state.publish(Arc::new(vec![4, 5, 6]));
///
/// // The old generation stays coherent for whoever holds it.
/// assert_eq!(*snapshot, vec![1, 2, 3]);
/// assert_eq!(*state.snapshot(), vec![4, 5, 6]);
/// ```
pub struct EventuallyConsistentSharedState<T> {
    current: RwLock<Arc<T>>,
}

impl<T> EventuallyConsistentSharedState<T> {
    /// Creates the container with an initial state.
    pub fn new(initial: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Returns an ephemeral snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Publishes a new snapshot, replacing the current one. Readers holding
    /// earlier snapshots are unaffected.
    pub fn publish(&self, snapshot: Arc<T>) {
        *self.current.write() = snapshot;
    }
}
