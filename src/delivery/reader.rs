//! reader.rs
//! Consumer handle over a shared device, the equivalent of an open device
//! file. Every handle drains the same queue: a sample goes to whichever
//! reader claims it first, there is no per-reader copy.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::delivery::{
    queue::CancelToken,
    readiness::{Readiness, ReadinessWatch},
};
use crate::device::SimTemp;
use crate::error::ReadError;
use crate::sensor::sample::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    #[default]
    Blocking,
    NonBlocking,
}

pub struct SampleReader {
    dev: Arc<SimTemp>,
    mode: ReadMode,
    cancel: CancelToken,
    watch: ReadinessWatch,
}

impl SampleReader {
    pub fn new(dev: Arc<SimTemp>, mode: ReadMode) -> Self {
        let cancel = dev.cancel_token();
        let watch = dev.subscribe();
        Self { dev, mode, cancel, watch }
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ReadMode) {
        self.mode = mode;
    }

    /// Token that interrupts this reader's blocking calls from another thread.
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next sample per the handle's mode. Blocking waits are interruptible
    /// through `cancel_handle`.
    pub fn next_sample(&self) -> Result<Sample, ReadError> {
        match self.mode {
            ReadMode::Blocking => self.dev.take_cancellable(&self.cancel, None),
            ReadMode::NonBlocking => self.dev.try_take(),
        }
    }

    pub fn next_sample_timeout(&self, timeout: Duration) -> Result<Sample, ReadError> {
        self.dev
            .take_cancellable(&self.cancel, Some(Instant::now() + timeout))
    }

    /// Binary read of exactly one record into `buf`.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, ReadError> {
        self.dev.check_record_buffer(buf.len())?;
        let sample = self.next_sample()?;
        sample.write_to(buf)
    }

    pub fn readiness(&self) -> Readiness {
        self.dev.readiness()
    }

    pub fn poll(&self, timeout: Duration) -> Readiness {
        self.dev.poll(timeout)
    }

    /// Waits until a sample is queued. A pending alert with nothing queued
    /// does not end the wait. Returns false on timeout or shutdown.
    pub fn wait_readable(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let r = self.dev.poll(left);
            if r.readable {
                return true;
            }
            if self.dev.is_closed() || left.is_zero() {
                return false;
            }
            // priority alone returns at once; sleep until the next push
            if r.priority && self.watch.wait_until(deadline).is_none() {
                return self.dev.readiness().readable;
            }
        }
    }
}
