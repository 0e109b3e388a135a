//! stats.rs
//! Monotone counters for the sampling pipeline.
//!
//! Each counter is its own atomic; a snapshot is not a transaction across
//! the three of them.

use serde::Serialize;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
pub struct Statistics {
    updates: AtomicU64,
    alerts: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub updates: u64,
    pub alerts: u64,
    pub errors: u64,
}

impl Statistics {
    pub const fn new() -> Self {
        Self {
            updates: AtomicU64::new(0),
            alerts: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// One per generated sample, dropped or not.
    #[inline]
    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert(&self) {
        self.alerts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            updates: self.updates.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updates={} alerts={} errors={}",
            self.updates, self.alerts, self.errors
        )
    }
}
