//! attributes.rs
//! Text key/value view of the control plane, one attribute per tunable plus
//! a read-only statistics line.
//!
//! | name          | show                          | store                  |
//! |---------------|-------------------------------|------------------------|
//! | sampling_ms   | `100\n`                       | integer in [10, 10000] |
//! | threshold_mC  | `45000\n`                     | signed integer         |
//! | mode          | `normal\n`                    | name or code 0/1/2     |
//! | stats         | `updates=N alerts=N errors=N` | read-only              |
//!
//! Input is trimmed. A rejected store leaves the device untouched.

use std::{fmt, str::FromStr};

use crate::control::config::Mode;
use crate::device::SimTemp;
use crate::error::{AttributeError, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    SamplingMs,
    ThresholdMc,
    Mode,
    Stats,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::SamplingMs,
        Attribute::ThresholdMc,
        Attribute::Mode,
        Attribute::Stats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::SamplingMs => "sampling_ms",
            Attribute::ThresholdMc => "threshold_mC",
            Attribute::Mode => "mode",
            Attribute::Stats => "stats",
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, Attribute::Stats)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| AttributeError::Unknown(s.to_string()))
    }
}

/// Current value as text, newline terminated.
pub fn show(dev: &SimTemp, attr: Attribute) -> String {
    let config = dev.config();
    match attr {
        Attribute::SamplingMs => format!("{}\n", config.sampling_ms()),
        Attribute::ThresholdMc => format!("{}\n", config.threshold_mc()),
        Attribute::Mode => format!("{}\n", config.mode()),
        Attribute::Stats => format!("{}\n", dev.stats_snapshot()),
    }
}

/// Parses `input` and applies it. Returns the number of bytes consumed.
pub fn store(dev: &SimTemp, attr: Attribute, input: &str) -> Result<usize, AttributeError> {
    let text = input.trim();
    let config = dev.config();
    match attr {
        Attribute::SamplingMs => config.set_sampling_ms(parse(attr, text)?)?,
        Attribute::ThresholdMc => config.set_threshold_mc(parse(attr, text)?),
        Attribute::Mode => config.set_mode(text.parse::<Mode>()?),
        Attribute::Stats => return Err(AttributeError::ReadOnly(attr.name())),
    }
    Ok(input.len())
}

pub fn show_by_name(dev: &SimTemp, name: &str) -> Result<String, AttributeError> {
    Ok(show(dev, name.parse()?))
}

pub fn store_by_name(dev: &SimTemp, name: &str, input: &str) -> Result<usize, AttributeError> {
    store(dev, name.parse()?, input)
}

fn parse<T: FromStr>(attr: Attribute, text: &str) -> Result<T, ConfigError> {
    text.parse::<T>().map_err(|_| ConfigError::Parse {
        attribute: attr.name(),
        input: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::config::Configuration;

    fn dev() -> SimTemp {
        SimTemp::new(Configuration::default(), 4).unwrap()
    }

    #[test]
    fn show_defaults() {
        let d = dev();
        assert_eq!(show(&d, Attribute::SamplingMs), "100\n");
        assert_eq!(show(&d, Attribute::ThresholdMc), "45000\n");
        assert_eq!(show(&d, Attribute::Mode), "normal\n");
        assert_eq!(show(&d, Attribute::Stats), "updates=0 alerts=0 errors=0\n");
    }

    #[test]
    fn store_round_trips_through_show() {
        let d = dev();
        assert_eq!(store(&d, Attribute::SamplingMs, "250\n"), Ok(4));
        store(&d, Attribute::ThresholdMc, "-1500").unwrap();
        store(&d, Attribute::Mode, "RAMP").unwrap();

        assert_eq!(show(&d, Attribute::SamplingMs), "250\n");
        assert_eq!(show(&d, Attribute::ThresholdMc), "-1500\n");
        assert_eq!(show(&d, Attribute::Mode), "ramp\n");
    }

    #[test]
    fn invalid_text_is_rejected_without_mutation() {
        let d = dev();
        let before = d.get_config();

        assert!(matches!(
            store(&d, Attribute::SamplingMs, "fast"),
            Err(AttributeError::Invalid(ConfigError::Parse { attribute: "sampling_ms", .. }))
        ));
        assert!(matches!(
            store(&d, Attribute::SamplingMs, "5"),
            Err(AttributeError::Invalid(ConfigError::SamplingOutOfRange { .. }))
        ));
        assert!(store(&d, Attribute::ThresholdMc, "12.5").is_err());
        assert!(store(&d, Attribute::Mode, "sine").is_err());
        assert_eq!(d.get_config(), before);
    }

    #[test]
    fn stats_is_read_only() {
        let d = dev();
        assert_eq!(
            store(&d, Attribute::Stats, "0"),
            Err(AttributeError::ReadOnly("stats"))
        );
    }

    #[test]
    fn lookup_by_name() {
        let d = dev();
        assert_eq!(show_by_name(&d, "mode").unwrap(), "normal\n");
        store_by_name(&d, "mode", "1").unwrap();
        assert_eq!(show_by_name(&d, "mode").unwrap(), "noisy\n");
        assert_eq!(
            show_by_name(&d, "humidity"),
            Err(AttributeError::Unknown("humidity".to_string()))
        );
    }
}
