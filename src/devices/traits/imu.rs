//! IMU sensor trait and sample type
//!
//! Device-independent interface for 6-axis inertial sensors consumed by the
//! attitude subsystem. Register-level drivers (MPU6050 and friends) live in
//! firmware crates and implement [`ImuSensor`].
//!
//! ## Units
//!
//! Samples carry accelerometer readings in g and gyroscope rates in deg/s,
//! matching the sensor's configured full-scale ranges. The tilt math only
//! uses accelerometer ratios, and integrating deg/s over seconds yields the
//! degree angles the complementary filter blends, so no unit conversion
//! happens downstream.

use nalgebra::Vector3;

/// IMU error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImuError {
    /// Bus transaction failed
    BusError,
    /// Data validation failed (e.g., stuck sensor)
    InvalidData,
    /// Driver not initialized
    NotInitialized,
}

/// One 6-axis inertial sample
///
/// Immutable once read; produced once per control tick.
#[derive(Debug, Clone, Copy)]
pub struct ImuSample {
    /// Linear acceleration in g, body frame (includes gravity)
    pub accel: Vector3<f32>,

    /// Angular rate in deg/s, body frame
    pub gyro: Vector3<f32>,

    /// Die temperature in °C, reported by the driver, unused by the filter
    pub temperature: f32,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            accel: Vector3::new(0.0, 0.0, 1.0), // level, at rest
            gyro: Vector3::zeros(),
            temperature: 25.0,
        }
    }
}

impl ImuSample {
    /// Sample with the given accelerometer and gyro readings
    pub fn new(accel: Vector3<f32>, gyro: Vector3<f32>) -> Self {
        Self {
            accel,
            gyro,
            ..Default::default()
        }
    }
}

/// IMU sensor interface
///
/// One synchronous-looking read per call; the core never retries a failed
/// read internally.
#[allow(async_fn_in_trait)]
pub trait ImuSensor {
    /// Read one sample.
    ///
    /// # Errors
    ///
    /// Returns [`ImuError`] if the underlying bus transaction fails.
    async fn read_sample(&mut self) -> Result<ImuSample, ImuError>;

    /// Check if the sensor is producing valid data.
    fn is_healthy(&self) -> bool;
}
