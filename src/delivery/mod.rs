//! Consumer side: bounded queue, readiness signalling and reader handles.

pub mod queue;
pub mod reader;
pub mod readiness;
