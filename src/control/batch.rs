//! batch.rs
//! Request/response exchange for reading or replacing the whole
//! configuration tuple in one step.
//!
//! Payload: 12 bytes little-endian `sampling_ms: u32, threshold_mc: i32,
//! mode: u32`. Unknown request codes are reported apart from validation
//! failures.

use crate::control::config::{Configuration, Mode};
use crate::device::SimTemp;
use crate::error::ControlError;

pub const SET_CONFIG: u32 = 1;
pub const GET_CONFIG: u32 = 2;

pub const CONFIG_RECORD_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    SetConfig(Configuration),
    GetConfig,
}

impl Request {
    pub fn decode(code: u32, payload: &[u8]) -> Result<Self, ControlError> {
        match code {
            SET_CONFIG => Ok(Request::SetConfig(decode_config(payload)?)),
            GET_CONFIG => Ok(Request::GetConfig),
            other => Err(ControlError::UnknownRequest(other)),
        }
    }
}

pub fn encode_config(config: &Configuration) -> [u8; CONFIG_RECORD_SIZE] {
    let mut out = [0u8; CONFIG_RECORD_SIZE];
    out[0..4].copy_from_slice(&config.sampling_ms.to_le_bytes());
    out[4..8].copy_from_slice(&config.threshold_mc.to_le_bytes());
    out[8..12].copy_from_slice(&config.mode.code().to_le_bytes());
    out
}

/// Decodes the record shape only; range checks happen in `set_config`.
pub fn decode_config(payload: &[u8]) -> Result<Configuration, ControlError> {
    let record = check_len(payload)?;
    let word = |i: usize| [record[i], record[i + 1], record[i + 2], record[i + 3]];

    Ok(Configuration {
        sampling_ms: u32::from_le_bytes(word(0)),
        threshold_mc: i32::from_le_bytes(word(4)),
        mode: Mode::from_code(u32::from_le_bytes(word(8)))?,
    })
}

/// Handles one request. `GET_CONFIG` writes the current tuple into
/// `payload`; `SET_CONFIG` reads the new tuple from it.
pub fn dispatch(dev: &SimTemp, code: u32, payload: &mut [u8]) -> Result<(), ControlError> {
    match Request::decode(code, payload)? {
        Request::SetConfig(config) => dev.set_config(config)?,
        Request::GetConfig => {
            check_len(payload)?;
            payload[..CONFIG_RECORD_SIZE].copy_from_slice(&encode_config(&dev.get_config()));
        }
    }
    Ok(())
}

fn check_len(payload: &[u8]) -> Result<&[u8], ControlError> {
    payload
        .get(..CONFIG_RECORD_SIZE)
        .ok_or(ControlError::ShortPayload {
            needed: CONFIG_RECORD_SIZE,
            got: payload.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn dev() -> SimTemp {
        SimTemp::new(Configuration::default(), 4).unwrap()
    }

    #[test]
    fn set_then_get() {
        let d = dev();
        let wanted = Configuration::new(250, 42_000, Mode::Ramp);
        let mut payload = encode_config(&wanted);
        dispatch(&d, SET_CONFIG, &mut payload).unwrap();

        let mut out = [0u8; CONFIG_RECORD_SIZE];
        dispatch(&d, GET_CONFIG, &mut out).unwrap();
        assert_eq!(decode_config(&out), Ok(wanted));
    }

    #[test]
    fn unknown_code_is_distinct_from_validation() {
        let d = dev();
        let mut payload = encode_config(&Configuration::default());

        assert_eq!(
            dispatch(&d, 7, &mut payload),
            Err(ControlError::UnknownRequest(7))
        );

        let mut bad = encode_config(&Configuration::new(5, 0, Mode::Normal));
        assert_eq!(
            dispatch(&d, SET_CONFIG, &mut bad),
            Err(ControlError::Invalid(ConfigError::SamplingOutOfRange {
                value: 5,
                min: 10,
                max: 10_000
            }))
        );
        assert_eq!(d.get_config(), Configuration::default());
    }

    #[test]
    fn unknown_mode_code_is_a_validation_error() {
        let d = dev();
        let mut payload = encode_config(&Configuration::default());
        payload[8..12].copy_from_slice(&9u32.to_le_bytes());

        assert_eq!(
            dispatch(&d, SET_CONFIG, &mut payload),
            Err(ControlError::Invalid(ConfigError::UnknownModeCode(9)))
        );
    }

    #[test]
    fn short_payload_is_rejected() {
        let d = dev();
        let mut small = [0u8; 8];
        assert_eq!(
            dispatch(&d, GET_CONFIG, &mut small),
            Err(ControlError::ShortPayload { needed: 12, got: 8 })
        );
        assert!(small.iter().all(|&b| b == 0));
    }
}
