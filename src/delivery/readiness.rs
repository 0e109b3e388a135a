//! readiness.rs
//! Push-driven readiness signalling for event-waiting consumers.
//!
//! Two conditions are observable independently:
//! - `readable`  the queue holds at least one sample
//! - `priority`  an alert is pending (not yet delivered)
//!
//! Consumers register a waker; the device calls `notify` after every push
//! that made data available or announced an alert. Wakers report whether
//! their waiting side still exists; dead registrations are pruned on the
//! next notification and on every new registration, so the list stays
//! bounded by the number of live watchers.

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub readable: bool,
    pub priority: bool,
}

impl Readiness {
    pub const NONE: Readiness = Readiness { readable: false, priority: false };

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.readable || self.priority
    }
}

/// Anything that can be woken on a readiness change.
pub trait ReadinessWaker: Send + Sync {
    /// Returns `false` once nobody is listening and the waker can be dropped.
    fn wake(&self, readiness: Readiness) -> bool;

    /// Whether the waiting side still exists.
    fn is_alive(&self) -> bool;
}

#[derive(Default)]
pub struct ReadinessRegistry {
    wakers: Mutex<Vec<Box<dyn ReadinessWaker>>>,
}

impl ReadinessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, waker: Box<dyn ReadinessWaker>) {
        let mut wakers = self.wakers.lock();
        wakers.retain(|w| w.is_alive());
        wakers.push(waker);
    }

    pub fn notify(&self, readiness: Readiness) {
        self.wakers.lock().retain(|w| w.wake(readiness));
    }

    pub fn len(&self) -> usize {
        self.wakers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Waker half backed by a one-slot crossbeam channel. A full slot means a
/// notification is already pending, so extra wakes coalesce.
pub struct ChannelWaker {
    tx: Sender<Readiness>,
    alive: Arc<AtomicBool>,
}

impl ReadinessWaker for ChannelWaker {
    fn wake(&self, readiness: Readiness) -> bool {
        match self.tx.try_send(readiness) {
            Ok(()) | Err(TrySendError::Full(_)) => self.is_alive(),
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Receiving half handed to a consumer by `SimTemp::subscribe`.
pub struct ReadinessWatch {
    rx: Receiver<Readiness>,
    alive: Arc<AtomicBool>,
}

impl ReadinessWatch {
    pub fn channel() -> (ChannelWaker, ReadinessWatch) {
        let (tx, rx) = bounded(1);
        let alive = Arc::new(AtomicBool::new(true));
        (
            ChannelWaker { tx, alive: Arc::clone(&alive) },
            ReadinessWatch { rx, alive },
        )
    }

    /// Pending notification, if any, without waiting.
    pub fn try_next(&self) -> Option<Readiness> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next notification.
    pub fn wait(&self, timeout: Duration) -> Option<Readiness> {
        self.wait_until(Instant::now() + timeout)
    }

    pub fn wait_until(&self, deadline: Instant) -> Option<Readiness> {
        match self.rx.recv_deadline(deadline) {
            Ok(r) => Some(r),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for ReadinessWatch {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}
