// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test doubles for exercising caches.
//!
//! [`MockDataSource`] is a map-backed source of record with operation
//! recording, validity and failure injection, and a gate that can hold
//! retrievals mid-flight, which is how the delete-during-retrieve races
//! are driven deterministically. [`LookupRecorder`] captures the polling
//! hydrator's instrumentation stream for assertion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::{CacheDataSource, CacheLookupResult};

type ValidityPredicate<K, V> = Box<dyn Fn(&K, &V) -> bool + Send>;
type FailurePredicate<K> = Box<dyn Fn(&K) -> bool + Send>;

#[derive(Default)]
struct Gate {
    blocked: bool,
    parked: usize,
}

struct MockState<K, V> {
    data: Mutex<HashMap<K, V>>,
    retrieves: Mutex<Vec<K>>,
    valid_when: Mutex<Option<ValidityPredicate<K, V>>>,
    fail_when: Mutex<Option<FailurePredicate<K>>>,
    gate: Mutex<Gate>,
    parked_changed: Condvar,
    released: Condvar,
}

/// A configurable in-memory source of record for tests.
///
/// Clones share state, so a test can keep a handle while the cache under
/// test owns another:
///
/// ```
/// use cistern::testing::MockDataSource;
/// use cistern::CacheDataSource;
///
/// let source = MockDataSource::new();
/// source.insert("key".to_string(), 42);
///
/// let handle = source.clone();
/// assert_eq!(handle.retrieve(&"key".to_string()), Some(42));
/// assert_eq!(source.retrieve_count(), 1);
/// ```
pub struct MockDataSource<K, V> {
    state: Arc<MockState<K, V>>,
}

impl<K, V> Clone for MockDataSource<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> Default for MockDataSource<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockDataSource<K, V> {
    /// Creates an empty source for which every entry is valid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                data: Mutex::new(HashMap::new()),
                retrieves: Mutex::new(Vec::new()),
                valid_when: Mutex::new(None),
                fail_when: Mutex::new(None),
                gate: Mutex::new(Gate::default()),
                parked_changed: Condvar::new(),
                released: Condvar::new(),
            }),
        }
    }

    /// Sets the predicate behind [`CacheDataSource::is_valid`]. Without
    /// one, every cached value is valid.
    pub fn valid_when<F>(&self, predicate: F)
    where
        F: Fn(&K, &V) -> bool + Send + 'static,
    {
        *self.state.valid_when.lock() = Some(Box::new(predicate));
    }

    /// Makes retrievals fail (return `None`) for keys matching the
    /// predicate. Replaces any previous predicate.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool + Send + 'static,
    {
        *self.state.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Holds every subsequent retrieval mid-flight until
    /// [`release_retrievals`](Self::release_retrievals).
    pub fn hold_retrievals(&self) {
        self.state.gate.lock().blocked = true;
    }

    /// Releases retrievals parked by [`hold_retrievals`](Self::hold_retrievals).
    pub fn release_retrievals(&self) {
        self.state.gate.lock().blocked = false;
        self.state.released.notify_all();
    }

    /// Blocks until at least one retrieval is parked at the gate.
    pub fn wait_until_parked(&self) {
        let mut gate = self.state.gate.lock();
        while gate.parked == 0 {
            self.state.parked_changed.wait(&mut gate);
        }
    }

    /// Returns how many retrievals have been issued.
    #[must_use]
    pub fn retrieve_count(&self) -> usize {
        self.state.retrieves.lock().len()
    }

    fn pass_gate(&self) {
        let mut gate = self.state.gate.lock();
        if gate.blocked {
            gate.parked += 1;
            self.state.parked_changed.notify_all();
            while gate.blocked {
                self.state.released.wait(&mut gate);
            }
            gate.parked -= 1;
        }
    }
}

impl<K, V> MockDataSource<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Inserts or replaces an entry.
    pub fn insert(&self, key: K, value: V) {
        self.state.data.lock().insert(key, value);
    }

    /// Removes an entry, so subsequent retrievals of it fail.
    pub fn remove(&self, key: &K) {
        self.state.data.lock().remove(key);
    }

    /// Returns every key retrieved so far, in order.
    #[must_use]
    pub fn retrieved_keys(&self) -> Vec<K> {
        self.state.retrieves.lock().clone()
    }
}

impl<K, V> CacheDataSource<K, V> for MockDataSource<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn retrieve(&self, key: &K) -> Option<V> {
        self.state.retrieves.lock().push(key.clone());
        self.pass_gate();

        if let Some(fail) = self.state.fail_when.lock().as_ref() {
            if fail(key) {
                return None;
            }
        }

        self.state.data.lock().get(key).cloned()
    }

    fn is_valid(&self, key: &K, value: &V) -> bool {
        match self.state.valid_when.lock().as_ref() {
            Some(valid) => valid(key, value),
            None => true,
        }
    }
}

/// Captures the instrumentation stream of a polling hydrator.
///
/// The recorder is cheap to clone and the callback handed to the hydrator
/// shares its buffer:
///
/// ```
/// use cistern::testing::LookupRecorder;
/// use cistern::CacheLookupResult;
///
/// let recorder = LookupRecorder::new();
/// let callback = recorder.callback();
///
/// callback(CacheLookupResult::Hit);
/// assert_eq!(recorder.count_of(CacheLookupResult::Hit), 1);
/// ```
#[derive(Clone, Default)]
pub struct LookupRecorder {
    events: Arc<Mutex<Vec<CacheLookupResult>>>,
}

impl LookupRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the callback to install on the hydrator.
    #[must_use]
    pub fn callback(&self) -> impl Fn(CacheLookupResult) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |result| events.lock().push(result)
    }

    /// Returns every recorded event, in order.
    #[must_use]
    pub fn events(&self) -> Vec<CacheLookupResult> {
        self.events.lock().clone()
    }

    /// Returns how many times a particular result was recorded.
    #[must_use]
    pub fn count_of(&self, result: CacheLookupResult) -> usize {
        self.events.lock().iter().filter(|event| **event == result).count()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
