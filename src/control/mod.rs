//! Control plane: the config store and its text and batch front-ends.

pub mod attributes;
pub mod batch;
pub mod config;
