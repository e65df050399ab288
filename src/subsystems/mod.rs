//! Estimation and actuation subsystems

pub mod attitude;
pub mod control;
