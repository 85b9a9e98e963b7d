//! Foundation utilities shared across the collision engine

pub mod logging;
pub mod math;
