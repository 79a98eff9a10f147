// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A periodic task running on a dedicated background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

type PollBody = Box<dyn Fn(&CancelFlag) + Send + 'static>;

struct TaskState {
    interval: Mutex<Duration>,
    // The condvar's mutex is held only around the interruptible wait, never
    // while the task body runs, so shutdown can always signal promptly.
    gate: Mutex<()>,
    wakeup: Condvar,
    active: AtomicBool,
}

impl TaskState {
    fn new(interval: Duration) -> Self {
        Self {
            interval: Mutex::new(interval),
            gate: Mutex::new(()),
            wakeup: Condvar::new(),
            active: AtomicBool::new(true),
        }
    }
}

/// Lets a task body observe a shutdown request mid-iteration.
///
/// The polling loop only checks for shutdown between waits; a task that
/// iterates over many items should check the flag between items and return
/// early, which is what keeps teardown latency bounded by a single item
/// rather than a full pass.
pub struct CancelFlag {
    state: Arc<TaskState>,
}

impl CancelFlag {
    /// Returns true once shutdown has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        !self.state.active.load(Ordering::Acquire)
    }
}

/// A periodic task executed on its own background thread.
///
/// Execution begins immediately upon construction. The worker waits out the
/// polling interval on a condition variable rather than sleeping, so
/// dropping the task wakes it immediately instead of waiting for the
/// interval to elapse; an iteration already in flight is allowed to finish
/// (see [`CancelFlag`] for how it can cut itself short).
///
/// # Examples
///
/// ```
/// use cistern::sync::PollingTask;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let counter = Arc::new(AtomicU32::new(0));
/// let observed = Arc::clone(&counter);
///
/// let task = PollingTask::new(Duration::from_millis(1), move |_cancel| {
///     observed.fetch_add(1, Ordering::Relaxed);
/// });
///
/// std::thread::sleep(Duration::from_millis(100));
/// assert!(counter.load(Ordering::Relaxed) > 0);
/// drop(task); // signals shutdown and joins the worker
/// ```
pub struct PollingTask {
    state: Arc<TaskState>,
    worker: Option<JoinHandle<()>>,
}

impl PollingTask {
    /// Starts a task that runs every `interval`.
    pub fn new<F>(interval: Duration, task: F) -> Self
    where
        F: Fn(&CancelFlag) + Send + 'static,
    {
        Self::from_state(Arc::new(TaskState::new(interval)), Box::new(task))
    }

    fn from_state(state: Arc<TaskState>, task: PollBody) -> Self {
        let worker_state = Arc::clone(&state);
        let worker = thread::spawn(move || Self::run(&worker_state, &task));

        Self {
            state,
            worker: Some(worker),
        }
    }

    /// Updates the polling interval. Takes effect on the next wait; an
    /// in-progress wait still runs to its original deadline.
    pub fn set_polling_rate(&self, interval: Duration) {
        *self.state.interval.lock() = interval;
    }

    fn run(state: &Arc<TaskState>, task: &PollBody) {
        let cancel = CancelFlag {
            state: Arc::clone(state),
        };

        loop {
            let deadline = Instant::now() + *state.interval.lock();
            let mut timed_out = false;

            {
                let mut gate = state.gate.lock();

                // Re-checked under the gate so a shutdown signaled between
                // iterations cannot slip past into a full-interval wait.
                while state.active.load(Ordering::Acquire) {
                    if state.wakeup.wait_until(&mut gate, deadline).timed_out() {
                        timed_out = true;
                        break;
                    }
                    // Woken without timeout: either shutdown (loop exits) or
                    // a spurious wakeup (wait again for the remaining time).
                }
            }

            if !state.active.load(Ordering::Acquire) {
                break;
            }

            if timed_out {
                task(&cancel);
            }
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.state.active.store(false, Ordering::Release);

        // Serialize with the worker's check-then-wait so the notification
        // cannot be lost, then wake it.
        drop(self.state.gate.lock());
        self.state.wakeup.notify_all();

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Updates the polling rate of the task it was issued by.
pub struct PollRateSetter {
    state: Arc<TaskState>,
}

impl PollRateSetter {
    /// Sets the polling interval. Takes effect on the next wait.
    pub fn set(&self, interval: Duration) {
        *self.state.interval.lock() = interval;
    }
}

/// Like [`PollingTask`], but the task body receives a [`PollRateSetter`] so
/// the task itself can drive the cadence. Useful when the polling rate is
/// determined by the data being polled, such as a `Retry-After` header or a
/// lease duration.
pub struct SelfUpdatingPollingTask {
    _task: PollingTask,
}

impl SelfUpdatingPollingTask {
    /// Starts a self-pacing task with an initial interval.
    pub fn new<F>(interval: Duration, task: F) -> Self
    where
        F: Fn(&PollRateSetter) + Send + 'static,
    {
        let state = Arc::new(TaskState::new(interval));
        let setter = PollRateSetter {
            state: Arc::clone(&state),
        };

        Self {
            _task: PollingTask::from_state(state, Box::new(move |_cancel| task(&setter))),
        }
    }
}
