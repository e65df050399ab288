//! Attitude estimation
//!
//! Two cooperating pieces:
//! - [`calibration`]: measures per-axis sensor bias at rest and loads/saves
//!   it through the [`calibration::CalibrationStore`] port
//! - [`filter`]: fuses bias-corrected accelerometer tilt with integrated
//!   gyro rates into drift-corrected roll/pitch
//!
//! The filter owns its state explicitly (no globals), so several estimators
//! can run side by side in tests.

pub mod calibration;
pub mod filter;

pub use calibration::{
    average_samples, load_or_calibrate, sample_offsets, CalibrationConfig, CalibrationError,
    CalibrationOffsets, CalibrationStore, StoreError,
};
pub use filter::{Attitude, ComplementaryFilter, FilterConfig};
