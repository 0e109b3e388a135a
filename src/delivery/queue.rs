//! queue.rs
//! Fixed-capacity FIFO between the sampler and its consumers.
//!
//! - Drop policy: a push on a full queue discards the new sample; nothing
//!   is ever evicted and the producer never waits.
//! - Alert-pending is a sticky flag kept under the same lock as the samples.
//!   Any ALERT push raises it (even a dropped one); popping an ALERT sample
//!   lowers it inside the same critical section, unless another ALERT
//!   sample is still queued behind it.
//! - Every accepted push wakes at least one blocked popper.
//! - Shared-queue semantics: concurrent consumers compete and each sample is
//!   handed to exactly one of them.

use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Instant,
};

use crate::delivery::readiness::Readiness;
use crate::error::ReadError;
use crate::sensor::sample::Sample;

/// Default number of samples held before new ones are dropped.
pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Debug)]
struct QueueState {
    samples: VecDeque<Sample>,
    alert_pending: bool,
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

#[derive(Debug)]
pub struct SampleQueue {
    shared: Arc<Shared>,
    capacity: usize,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    samples: VecDeque::with_capacity(capacity),
                    alert_pending: false,
                    closed: false,
                }),
                available: Condvar::new(),
            }),
            capacity,
        }
    }

    /// Appends `sample` if there is room. Returns whether the body was kept.
    pub fn push(&self, sample: Sample) -> bool {
        let accepted = {
            let mut state = self.shared.state.lock();
            if sample.is_alert() {
                state.alert_pending = true;
            }
            if state.samples.len() < self.capacity {
                state.samples.push_back(sample);
                true
            } else {
                false
            }
        };
        if accepted {
            self.shared.available.notify_one();
        }
        accepted
    }

    /// Waits until a sample is available. Returns `Cancelled` once the
    /// queue has been closed and drained.
    pub fn pop_blocking(&self) -> Result<Sample, ReadError> {
        self.pop_cancellable(None, None)
    }

    /// Blocking pop bounded by an optional cancel token and deadline.
    /// Neither a cancellation nor a timeout consumes a sample.
    pub fn pop_cancellable(
        &self,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<Sample, ReadError> {
        let mut state = self.shared.state.lock();
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(ReadError::Cancelled);
            }
            if let Some(sample) = take_front(&mut state) {
                return Ok(sample);
            }
            if state.closed {
                return Err(ReadError::Cancelled);
            }
            match deadline {
                Some(d) => {
                    if Instant::now() >= d {
                        return Err(ReadError::TimedOut);
                    }
                    self.shared.available.wait_until(&mut state, d);
                }
                None => self.shared.available.wait(&mut state),
            }
        }
    }

    pub fn pop_nonblocking(&self) -> Option<Sample> {
        take_front(&mut self.shared.state.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn alert_pending(&self) -> bool {
        self.shared.state.lock().alert_pending
    }

    /// Both readiness conditions read under one lock.
    pub fn readiness(&self) -> Readiness {
        let state = self.shared.state.lock();
        Readiness {
            readable: !state.samples.is_empty(),
            priority: state.alert_pending,
        }
    }

    /// Wakes every blocked popper; remaining samples can still be drained.
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            queue: Arc::downgrade(&self.shared),
        }
    }
}

fn take_front(state: &mut QueueState) -> Option<Sample> {
    let sample = state.samples.pop_front()?;
    if sample.is_alert() {
        state.alert_pending = state.samples.iter().any(Sample::is_alert);
    }
    Some(sample)
}

/// Interrupts blocked pops that were handed this token. Cloning shares the
/// same cancellation state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    queue: Weak<Shared>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(shared) = self.queue.upgrade() {
            // take the lock so a popper between its flag check and its wait
            // cannot miss this wakeup
            let _state = shared.state.lock();
            shared.available.notify_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
