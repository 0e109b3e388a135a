//! Sample record, waveform generation and the periodic sampler thread.

pub mod generator;
pub mod sample;
pub mod sampler;
