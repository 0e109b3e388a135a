//! async_reader.rs
//! Tokio-facing consumer. Readiness notifications from the device are
//! forwarded into a `Notify`, so an async task can await new samples
//! without parking a thread.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{sync::Notify, time};

use crate::delivery::readiness::{Readiness, ReadinessWaker};
use crate::device::SimTemp;
use crate::error::ReadError;
use crate::sensor::sample::Sample;

/// Stores a permit on every readiness change; dropped with the reader.
struct NotifyWaker(Weak<Notify>);

impl ReadinessWaker for NotifyWaker {
    fn wake(&self, _readiness: Readiness) -> bool {
        match self.0.upgrade() {
            Some(notify) => {
                notify.notify_one();
                true
            }
            None => false,
        }
    }

    fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

pub struct AsyncSampleReader {
    dev: Arc<SimTemp>,
    notify: Arc<Notify>,
}

impl AsyncSampleReader {
    pub fn new(dev: Arc<SimTemp>) -> Self {
        let notify = Arc::new(Notify::new());
        dev.register_waker(Box::new(NotifyWaker(Arc::downgrade(&notify))));
        Self { dev, notify }
    }

    /// Resolves once a sample or an alert is pending, or the device closed.
    pub async fn readable(&self) -> Readiness {
        loop {
            let current = self.dev.readiness();
            if current.is_ready() || self.dev.is_closed() {
                return current;
            }
            self.notify.notified().await;
        }
    }

    /// Next sample. Returns `Cancelled` once the device is closed and drained.
    pub async fn read(&self) -> Result<Sample, ReadError> {
        loop {
            match self.dev.try_take() {
                Err(ReadError::WouldBlock) if !self.dev.is_closed() => {
                    self.notify.notified().await;
                }
                Err(ReadError::WouldBlock) => return Err(ReadError::Cancelled),
                other => return other,
            }
        }
    }

    pub async fn read_timeout(&self, timeout: Duration) -> Result<Sample, ReadError> {
        time::timeout(timeout, self.read())
            .await
            .unwrap_or(Err(ReadError::TimedOut))
    }
}
