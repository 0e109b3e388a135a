//! device.rs
//! The simulated sensor device: one explicitly owned core shared by the
//! sampler thread and every consumer, plus the start/shutdown lifecycle.
//!
//! Locks are independent and never nested:
//! - config store  (RwLock, control plane vs. sampler snapshot)
//! - sample queue  (Mutex + Condvar, samples and alert-pending together)
//! - waker list    (Mutex, only taken after the queue lock is released)

use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use log::{debug, info};

use crate::control::config::{ConfigStore, Configuration};
use crate::delivery::{
    queue::{CancelToken, SampleQueue, DEFAULT_CAPACITY},
    readiness::{Readiness, ReadinessRegistry, ReadinessWaker, ReadinessWatch},
    reader::{ReadMode, SampleReader},
};
use crate::error::{ConfigError, DeviceError, ReadError};
use crate::sensor::{
    generator::Generator,
    sample::{Sample, RECORD_SIZE},
    sampler::Sampler,
};
use crate::utils::stats::{Statistics, StatsSnapshot};

pub struct SimTemp {
    config: ConfigStore,
    queue: SampleQueue,
    stats: Statistics,
    readiness: ReadinessRegistry,
    origin: Instant,
}

impl SimTemp {
    pub fn new(config: Configuration, capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            config: ConfigStore::new(config)?,
            queue: SampleQueue::new(capacity),
            stats: Statistics::new(),
            readiness: ReadinessRegistry::new(),
            origin: Instant::now(),
        })
    }

    /// Monotonic nanoseconds since the device was created.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    // ========================================================================
    // Control plane
    // ========================================================================

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn get_config(&self) -> Configuration {
        self.config.get_config()
    }

    pub fn set_config(&self, new: Configuration) -> Result<(), ConfigError> {
        self.config.set_config(new)
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ========================================================================
    // Producer side
    // ========================================================================

    /// Hands a freshly generated sample to the queue and wakes readiness
    /// watchers when data arrived or an alert was announced. An ALERT sample
    /// is announced even when the queue had no room for its body.
    pub fn publish(&self, sample: Sample) -> bool {
        let accepted = self.queue.push(sample);
        if !accepted {
            debug!(
                "[SimTemp] queue full ({}), dropped sample t={}ns alert={}",
                self.queue.capacity(),
                sample.timestamp_ns,
                sample.is_alert()
            );
        }
        if accepted || sample.is_alert() {
            self.readiness.notify(self.queue.readiness());
        }
        accepted
    }

    // ========================================================================
    // Delivery side
    // ========================================================================

    pub fn queue(&self) -> &SampleQueue {
        &self.queue
    }

    /// Blocks until a sample is available or the device shuts down.
    pub fn take(&self) -> Result<Sample, ReadError> {
        self.queue.pop_blocking()
    }

    pub fn try_take(&self) -> Result<Sample, ReadError> {
        self.queue.pop_nonblocking().ok_or(ReadError::WouldBlock)
    }

    pub fn take_cancellable(
        &self,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> Result<Sample, ReadError> {
        self.queue.pop_cancellable(Some(cancel), deadline)
    }

    pub fn take_timeout(&self, timeout: Duration) -> Result<Sample, ReadError> {
        self.queue.pop_cancellable(None, Some(Instant::now() + timeout))
    }

    /// Copies one binary record into `buf`. A buffer shorter than one record
    /// is refused before the queue is touched and counted as an error.
    pub fn read(&self, buf: &mut [u8], mode: ReadMode) -> Result<usize, ReadError> {
        self.check_record_buffer(buf.len())?;
        let sample = match mode {
            ReadMode::Blocking => self.take()?,
            ReadMode::NonBlocking => self.try_take()?,
        };
        sample.write_to(buf)
    }

    pub(crate) fn check_record_buffer(&self, len: usize) -> Result<(), ReadError> {
        if len < RECORD_SIZE {
            self.stats.record_error();
            return Err(ReadError::ShortBuffer { needed: RECORD_SIZE, got: len });
        }
        Ok(())
    }

    pub fn readiness(&self) -> Readiness {
        self.queue.readiness()
    }

    pub fn register_waker(&self, waker: Box<dyn ReadinessWaker>) {
        self.readiness.register(waker);
    }

    pub fn subscribe(&self) -> ReadinessWatch {
        let (waker, watch) = ReadinessWatch::channel();
        self.register_waker(Box::new(waker));
        watch
    }

    /// Poll-style readiness query: returns immediately when either condition
    /// already holds, otherwise waits for a notification until `timeout`.
    /// Returns `Readiness::NONE` on timeout.
    pub fn poll(&self, timeout: Duration) -> Readiness {
        let current = self.readiness();
        if current.is_ready() || self.is_closed() {
            return current;
        }
        let deadline = Instant::now() + timeout;
        // register before re-checking so a push in between is not missed
        let watch = self.subscribe();
        loop {
            let current = self.readiness();
            if current.is_ready() || self.is_closed() {
                return current;
            }
            if watch.wait_until(deadline).is_none() {
                return self.readiness();
            }
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.queue.cancel_token()
    }

    /// Stops further blocking: wakes every waiter. Samples already queued
    /// stay readable.
    pub fn close(&self) {
        self.queue.close();
        self.readiness.notify(self.queue.readiness());
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl Default for SimTemp {
    fn default() -> Self {
        Self {
            config: ConfigStore::default(),
            queue: SampleQueue::new(DEFAULT_CAPACITY),
            stats: Statistics::new(),
            readiness: ReadinessRegistry::new(),
            origin: Instant::now(),
        }
    }
}

/// A running device: the shared core plus its sampler thread.
pub struct SimTempDevice {
    core: Arc<SimTemp>,
    sampler: Sampler,
}

impl SimTempDevice {
    pub fn start(config: Configuration, capacity: usize) -> Result<Self, DeviceError> {
        Self::start_with(config, capacity, Generator::new())
    }

    pub fn start_with(
        config: Configuration,
        capacity: usize,
        generator: Generator,
    ) -> Result<Self, DeviceError> {
        let core = Arc::new(SimTemp::new(config, capacity)?);
        let sampler = Sampler::spawn(Arc::clone(&core), generator)?;
        info!(
            "[SimTemp] started: sampling={}ms threshold={}mC mode={} capacity={}",
            config.sampling_ms,
            config.threshold_mc,
            config.mode,
            core.queue().capacity()
        );
        Ok(Self { core, sampler })
    }

    pub fn core(&self) -> &Arc<SimTemp> {
        &self.core
    }

    /// Opens a consumer handle. All handles drain the same queue.
    pub fn open(&self, mode: ReadMode) -> SampleReader {
        SampleReader::new(Arc::clone(&self.core), mode)
    }

    pub fn is_running(&self) -> bool {
        self.sampler.is_running()
    }

    /// Stops and joins the sampler, then closes the queue so blocked
    /// consumers return.
    pub fn shutdown(mut self) -> StatsSnapshot {
        self.stop()
    }

    fn stop(&mut self) -> StatsSnapshot {
        self.sampler.stop();
        self.core.close();
        let stats = self.core.stats_snapshot();
        info!("[SimTemp] shut down: {}", stats);
        stats
    }
}

impl Drop for SimTempDevice {
    fn drop(&mut self) {
        if !self.core.is_closed() {
            self.stop();
        }
    }
}
