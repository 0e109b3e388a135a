//! error.rs
//! Error types for the control plane and the consumer-facing delivery path.
//!
//! Every condition here is local and recoverable: callers retry or report
//! upward, the sampler keeps running.

use thiserror::Error;

/// Rejected configuration. The store is left untouched whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("sampling period {value} ms is out of range [{min}, {max}]")]
    SamplingOutOfRange { value: u32, min: u32, max: u32 },

    #[error("unknown mode code {0}")]
    UnknownModeCode(u32),

    #[error("unknown mode '{0}' (expected normal, noisy or ramp)")]
    UnknownModeName(String),

    #[error("invalid value '{input}' for {attribute}")]
    Parse {
        attribute: &'static str,
        input: String,
    },
}

/// Outcome of a consumer call that did not yield a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Non-blocking read on an empty queue.
    #[error("no sample available, operation would block")]
    WouldBlock,

    /// Caller buffer cannot hold one full record. Nothing was consumed.
    #[error("buffer of {got} bytes is smaller than one {needed}-byte record")]
    ShortBuffer { needed: usize, got: usize },

    /// Wait interrupted by a cancel token or by device shutdown.
    #[error("wait cancelled")]
    Cancelled,

    /// Wait reached its deadline with the queue still empty.
    #[error("wait timed out")]
    TimedOut,
}

/// Failure of a batch configuration exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("unknown control request code {0}")]
    UnknownRequest(u32),

    #[error("control payload of {got} bytes, expected {needed}")]
    ShortPayload { needed: usize, got: usize },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Failure of a text attribute read or write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("no such attribute '{0}'")]
    Unknown(String),

    #[error("attribute '{0}' is read-only")]
    ReadOnly(&'static str),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Failure to bring a device up.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("invalid initial configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn sampler thread: {0}")]
    Spawn(#[from] std::io::Error),
}
