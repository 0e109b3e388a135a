//! sampler.rs
//! Recurring task that drives the generator on its own thread.
//!
//! Real-time scheduling:
//! - deadlines advance from the previous nominal deadline, never from "now",
//!   so the cadence does not drift under load
//! - a tick that wakes after the following deadline forwards the schedule by
//!   whole periods (missed periods are skipped, not replayed in a burst)
//! - the wait is a channel receive with a deadline, finished by a short spin,
//!   so `stop` interrupts even a 10 s period immediately

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use thread_priority::{ThreadBuilderExt, ThreadPriority};
use log::{debug, info, warn};

use crate::device::SimTemp;
use crate::sensor::generator::Generator;

/// Final stretch before a deadline handled by spinning instead of blocking.
const SPIN_WINDOW: Duration = Duration::from_micros(500);

pub struct Sampler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sampler {
    /// Spawns the sampler thread. The first tick fires one period after start.
    pub fn spawn(dev: Arc<SimTemp>, generator: Generator) -> io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("simtemp-sampler".to_string())
            .spawn_with_priority(ThreadPriority::Max, move |prio| {
                if let Err(e) = prio {
                    warn!("[Sampler] running at default priority: {:?}", e);
                }
                run(dev, generator, stop_rx);
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the task and joins it. No tick is in flight once this returns.
    pub fn stop(&mut self) {
        // disconnecting the channel wakes the sampler out of its wait
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("[Sampler] thread panicked");
            }
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(dev: Arc<SimTemp>, mut generator: Generator, stop_rx: Receiver<()>) {
    let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);

    let mut deadline = Instant::now() + dev.get_config().sampling_period();
    let mut ticks: u64 = 0;
    info!("[Sampler] started");

    loop {
        if wait_until(&stop_rx, &sleeper, deadline) {
            break;
        }

        let outcome = generator.tick(&dev);
        ticks += 1;
        if !outcome.accepted {
            debug!("[Sampler] tick {} dropped (queue full)", ticks);
        }

        let (next, skipped) = forward(deadline, outcome.period, Instant::now());
        if skipped > 0 {
            debug!("[Sampler] overran, skipped {} period(s)", skipped);
        }
        deadline = next;
    }

    info!("[Sampler] stopped after {} ticks", ticks);
}

/// Sleeps until `deadline`. Returns true if a stop was requested instead.
fn wait_until(stop_rx: &Receiver<()>, sleeper: &SpinSleeper, deadline: Instant) -> bool {
    let coarse = deadline.checked_sub(SPIN_WINDOW).unwrap_or(deadline);
    match stop_rx.recv_deadline(coarse) {
        Err(RecvTimeoutError::Timeout) => {}
        Ok(()) | Err(RecvTimeoutError::Disconnected) => return true,
    }

    let now = Instant::now();
    if now < deadline {
        sleeper.sleep(deadline - now);
    }
    false
}

/// Next deadline after `previous` with forward semantics, plus the number
/// of whole periods skipped because `now` was already past them.
pub(crate) fn forward(previous: Instant, period: Duration, now: Instant) -> (Instant, u64) {
    let next = previous + period;
    if next > now || period.is_zero() {
        return (next, 0);
    }
    let behind = now.duration_since(next).as_nanos();
    let skipped = (behind / period.as_nanos()) as u64 + 1;
    let advance = period.saturating_mul(u32::try_from(skipped).unwrap_or(u32::MAX));
    (next + advance, skipped)
}
