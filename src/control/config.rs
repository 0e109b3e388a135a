//! config.rs
//! Live tunables: sampling period, alert threshold and generation mode.
//!
//! The whole tuple sits behind one RwLock so a reader never sees a mix of
//! old and new fields. Single-field setters validate first, then swap
//! under the same write lock.

use parking_lot::RwLock;
use serde::Serialize;
use std::{fmt, str::FromStr, time::Duration};
use log::{info, warn};

use crate::error::ConfigError;

pub const MIN_SAMPLING_MS: u32 = 10;
pub const MAX_SAMPLING_MS: u32 = 10_000;
pub const DEFAULT_SAMPLING_MS: u32 = 100;
pub const DEFAULT_THRESHOLD_MC: i32 = 45_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Noisy,
    Ramp,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Normal, Mode::Noisy, Mode::Ramp];

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Ramp => "ramp",
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Mode::Normal => 0,
            Mode::Noisy => 1,
            Mode::Ramp => 2,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(Mode::Normal),
            1 => Ok(Mode::Noisy),
            2 => Ok(Mode::Ramp),
            other => Err(ConfigError::UnknownModeCode(other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts a mode name (any case) or its numeric code.
impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Mode::from_code(code);
        }
        Mode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownModeName(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub sampling_ms: u32,
    pub threshold_mc: i32,
    pub mode: Mode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            sampling_ms: DEFAULT_SAMPLING_MS,
            threshold_mc: DEFAULT_THRESHOLD_MC,
            mode: Mode::Normal,
        }
    }
}

impl Configuration {
    pub fn new(sampling_ms: u32, threshold_mc: i32, mode: Mode) -> Self {
        Self { sampling_ms, threshold_mc, mode }
    }

    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.sampling_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sampling_ms(self.sampling_ms)
    }
}

pub fn validate_sampling_ms(ms: u32) -> Result<(), ConfigError> {
    if (MIN_SAMPLING_MS..=MAX_SAMPLING_MS).contains(&ms) {
        Ok(())
    } else {
        Err(ConfigError::SamplingOutOfRange {
            value: ms,
            min: MIN_SAMPLING_MS,
            max: MAX_SAMPLING_MS,
        })
    }
}

/// Shared configuration cell. Written by the control plane, read once per
/// tick by the generator.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Configuration>,
}

impl ConfigStore {
    pub fn new(initial: Configuration) -> Result<Self, ConfigError> {
        initial.validate()?;
        Ok(Self { current: RwLock::new(initial) })
    }

    /// Atomic snapshot of the whole tuple.
    #[inline]
    pub fn get_config(&self) -> Configuration {
        *self.current.read()
    }

    /// All-or-nothing replace.
    pub fn set_config(&self, new: Configuration) -> Result<(), ConfigError> {
        if let Err(e) = new.validate() {
            warn!("[Config] rejected {:?}: {}", new, e);
            return Err(e);
        }
        *self.current.write() = new;
        info!(
            "[Config] sampling={}ms threshold={}mC mode={}",
            new.sampling_ms, new.threshold_mc, new.mode
        );
        Ok(())
    }

    pub fn sampling_ms(&self) -> u32 {
        self.current.read().sampling_ms
    }

    pub fn set_sampling_ms(&self, ms: u32) -> Result<(), ConfigError> {
        if let Err(e) = validate_sampling_ms(ms) {
            warn!("[Config] rejected sampling period: {}", e);
            return Err(e);
        }
        self.current.write().sampling_ms = ms;
        info!("[Config] sampling={}ms", ms);
        Ok(())
    }

    pub fn threshold_mc(&self) -> i32 {
        self.current.read().threshold_mc
    }

    pub fn set_threshold_mc(&self, threshold_mc: i32) {
        self.current.write().threshold_mc = threshold_mc;
        info!("[Config] threshold={}mC", threshold_mc);
    }

    pub fn mode(&self) -> Mode {
        self.current.read().mode
    }

    pub fn set_mode(&self, mode: Mode) {
        self.current.write().mode = mode;
        info!("[Config] mode={}", mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_period_below_floor_and_keeps_previous() {
        let store = ConfigStore::default();
        let before = store.get_config();

        let err = store
            .set_config(Configuration::new(5, 1_000, Mode::Noisy))
            .unwrap_err();

        assert_eq!(err, ConfigError::SamplingOutOfRange { value: 5, min: 10, max: 10_000 });
        assert_eq!(store.get_config(), before);
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let store = ConfigStore::default();
        assert!(store.set_sampling_ms(MIN_SAMPLING_MS).is_ok());
        assert!(store.set_sampling_ms(MAX_SAMPLING_MS).is_ok());
        assert!(store.set_sampling_ms(MAX_SAMPLING_MS + 1).is_err());
        assert_eq!(store.sampling_ms(), MAX_SAMPLING_MS);
    }

    #[test]
    fn full_tuple_round_trips() {
        let store = ConfigStore::default();
        let cfg = Configuration::new(250, 42_000, Mode::Ramp);

        store.set_config(cfg).unwrap();
        assert_eq!(store.get_config(), cfg);
    }

    #[test]
    fn mode_parses_names_and_codes() {
        assert_eq!("ramp".parse::<Mode>(), Ok(Mode::Ramp));
        assert_eq!(" Noisy\n".parse::<Mode>(), Ok(Mode::Noisy));
        assert_eq!("0".parse::<Mode>(), Ok(Mode::Normal));
        assert_eq!("3".parse::<Mode>(), Err(ConfigError::UnknownModeCode(3)));
        assert!(matches!("hot".parse::<Mode>(), Err(ConfigError::UnknownModeName(_))));
    }

    #[test]
    fn invalid_initial_config_is_refused() {
        assert!(ConfigStore::new(Configuration::new(0, 0, Mode::Normal)).is_err());
    }
}
