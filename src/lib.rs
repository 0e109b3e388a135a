//! simtemp
//! Synthetic temperature sensor streaming core.
//!
//! A sampler thread generates one reading per period and pushes it into a
//! bounded FIFO (dropping when full). Consumers take samples blocking,
//! non-blocking, by poll-style readiness, or from async tasks. Sampling
//! period, alert threshold and waveform mode are tunable while running.

pub mod advanced;
pub mod control;
pub mod delivery;
pub mod device;
pub mod error;
pub mod sensor;
pub mod utils;

pub use control::config::{ConfigStore, Configuration, Mode};
pub use delivery::{
    readiness::Readiness,
    reader::{ReadMode, SampleReader},
};
pub use device::{SimTemp, SimTempDevice};
pub use error::{AttributeError, ConfigError, ControlError, DeviceError, ReadError};
pub use sensor::sample::{Sample, SampleFlags, RECORD_SIZE};
pub use utils::stats::StatsSnapshot;
