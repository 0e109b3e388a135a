//! generator.rs
//! Synthesizes one temperature sample per tick.
//!
//! - Normal: uniform in [40.000, 50.000) C
//! - Noisy:  uniform in [20.000, 60.000) C
//! - Ramp:   40.000 C rising 0.500 C per tick, wrapping back at 50.000 C
//!
//! Mode-local state (the ramp position) lives inside its `Waveform` arm, so a
//! mode switch drops it and returning to Ramp restarts at the floor.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{ops::Range, time::Duration};
use log::debug;

use crate::control::config::{Configuration, Mode};
use crate::device::SimTemp;
use crate::sensor::sample::{Sample, SampleFlags};

pub const NORMAL_RANGE_MC: Range<i32> = 40_000..50_000;
pub const NOISY_RANGE_MC: Range<i32> = 20_000..60_000;
pub const RAMP_FLOOR_MC: i32 = 40_000;
pub const RAMP_CEILING_MC: i32 = 50_000;
pub const RAMP_STEP_MC: i32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ramp {
    next_mc: i32,
}

impl Ramp {
    pub fn new() -> Self {
        Self { next_mc: RAMP_FLOOR_MC }
    }

    fn step(&mut self) -> i32 {
        let value = self.next_mc;
        self.next_mc += RAMP_STEP_MC;
        if self.next_mc >= RAMP_CEILING_MC {
            self.next_mc = RAMP_FLOOR_MC;
        }
        value
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Waveform {
    Normal,
    Noisy,
    Ramp(Ramp),
}

impl Waveform {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Normal => Waveform::Normal,
            Mode::Noisy => Waveform::Noisy,
            Mode::Ramp => Waveform::Ramp(Ramp::new()),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Waveform::Normal => Mode::Normal,
            Waveform::Noisy => Mode::Noisy,
            Waveform::Ramp(_) => Mode::Ramp,
        }
    }

    fn next_mc<R: Rng>(&mut self, rng: &mut R) -> i32 {
        match self {
            Waveform::Normal => rng.random_range(NORMAL_RANGE_MC),
            Waveform::Noisy => rng.random_range(NOISY_RANGE_MC),
            Waveform::Ramp(ramp) => ramp.step(),
        }
    }
}

/// Result of one scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub sample: Sample,
    /// Whether the queue kept the sample body.
    pub accepted: bool,
    /// Period in effect once the tick finished; the sampler schedules the
    /// next one with it.
    pub period: Duration,
}

/// Owned solely by the sampler task.
#[derive(Debug)]
pub struct Generator {
    waveform: Waveform,
    rng: StdRng,
}

impl Generator {
    pub fn new() -> Self {
        Self {
            waveform: Waveform::Normal,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic random stream, for tests and benches.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            waveform: Waveform::Normal,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// Pure part of a tick: temperature and flags for `config`.
    pub fn synthesize(&mut self, config: &Configuration, timestamp_ns: u64) -> Sample {
        if self.waveform.mode() != config.mode {
            debug!("[Generator] waveform {} -> {}", self.waveform.mode(), config.mode);
            self.waveform = Waveform::for_mode(config.mode);
        }

        let temp_mc = self.waveform.next_mc(&mut self.rng);
        let mut flags = SampleFlags::NEW;
        if temp_mc <= config.threshold_mc {
            flags.insert(SampleFlags::ALERT);
        }
        Sample::new(timestamp_ns, temp_mc, flags)
    }

    /// One full tick against the device: snapshot config, build the sample,
    /// count it, hand it to the queue.
    pub fn tick(&mut self, dev: &SimTemp) -> TickOutcome {
        let config = dev.get_config();
        let sample = self.synthesize(&config, dev.now_ns());

        dev.stats().record_update();
        if sample.is_alert() {
            dev.stats().record_alert();
        }
        let accepted = dev.publish(sample);

        TickOutcome {
            sample,
            accepted,
            period: dev.get_config().sampling_period(),
        }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
