//! IMU bias calibration
//!
//! Measures per-axis sensor error by averaging readings while the robot sits
//! level and at rest. The vertical accelerometer axis has gravity removed,
//! so a corrected vertical reading of zero means level.
//!
//! Offsets are computed once at startup (or loaded from the store) and stay
//! immutable for the lifetime of a run.

use crate::devices::traits::{ImuError, ImuSample, ImuSensor};
use core::fmt;
use core::future::Future;
use nalgebra::Vector3;

/// Per-axis sensor bias measured at rest
///
/// The six scalars the estimator subtracts from every raw sample.
/// `accel_err.z` is the mean vertical acceleration minus 1.0 g.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOffsets {
    /// Accelerometer error in g
    pub accel_err: Vector3<f32>,

    /// Gyroscope error in deg/s
    pub gyro_err: Vector3<f32>,
}

impl Default for CalibrationOffsets {
    /// Zero offsets (uncalibrated passthrough)
    fn default() -> Self {
        Self {
            accel_err: Vector3::zeros(),
            gyro_err: Vector3::zeros(),
        }
    }
}

/// Errors from the calibration procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Zero samples requested; averaging over none is undefined
    NoSamples,
    /// A sensor read failed; calibration aborts, no retries
    Sensor(ImuError),
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::NoSamples => write!(f, "calibration requires at least one sample"),
            CalibrationError::Sensor(e) => write!(f, "sensor read failed: {:?}", e),
        }
    }
}

/// Errors from persisting a calibration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Backing store cannot hold the record
    Full,
    /// Write to the backing store failed
    WriteFailed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Full => write!(f, "calibration store full"),
            StoreError::WriteFailed => write!(f, "calibration store write failed"),
        }
    }
}

/// Durable storage port for calibration records
///
/// Absence of a stored record is an ordinary `None`, not an error. A loaded
/// record is trusted completely.
pub trait CalibrationStore {
    /// Load the stored record, if one exists.
    fn try_load(&mut self) -> Option<CalibrationOffsets>;

    /// Persist a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be written.
    fn save(&mut self, offsets: &CalibrationOffsets) -> Result<(), StoreError>;
}

/// Calibration acquisition settings
#[derive(Debug, Clone, Copy)]
pub struct CalibrationConfig {
    /// Number of samples to average (default: 1000)
    pub n_samples: u32,

    /// Spacing between samples in microseconds (default: 20 000)
    pub period_us: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            period_us: 20_000,
        }
    }
}

/// Average a slice of samples into bias offsets
///
/// Each axis gets its arithmetic mean; gravity is subtracted from the
/// vertical accelerometer axis only.
///
/// # Errors
///
/// Returns [`CalibrationError::NoSamples`] for an empty slice.
pub fn average_samples(samples: &[ImuSample]) -> Result<CalibrationOffsets, CalibrationError> {
    if samples.is_empty() {
        return Err(CalibrationError::NoSamples);
    }

    let accel_sum = samples
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f32>, s| acc + s.accel);
    let gyro_sum = samples
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f32>, s| acc + s.gyro);

    let n = samples.len() as f32;
    let mut accel_err = accel_sum / n;
    accel_err.z -= 1.0;

    Ok(CalibrationOffsets {
        accel_err,
        gyro_err: gyro_sum / n,
    })
}

/// Acquire bias offsets from a stationary sensor
///
/// Reads `config.n_samples` samples at `config.period_us` spacing,
/// accumulating running sums so memory use stays constant. The robot must be
/// level and motionless for the whole acquisition.
///
/// # Errors
///
/// Returns [`CalibrationError::NoSamples`] if zero samples were requested,
/// or [`CalibrationError::Sensor`] on the first failed read.
pub async fn sample_offsets<I, D, Fut>(
    imu: &mut I,
    mut delay_us: D,
    config: &CalibrationConfig,
) -> Result<CalibrationOffsets, CalibrationError>
where
    I: ImuSensor,
    D: FnMut(u64) -> Fut,
    Fut: Future<Output = ()>,
{
    if config.n_samples == 0 {
        return Err(CalibrationError::NoSamples);
    }

    let mut accel_sum: Vector3<f32> = Vector3::zeros();
    let mut gyro_sum: Vector3<f32> = Vector3::zeros();

    for _ in 0..config.n_samples {
        let sample = imu.read_sample().await.map_err(CalibrationError::Sensor)?;
        accel_sum += sample.accel;
        gyro_sum += sample.gyro;
        delay_us(config.period_us).await;
    }

    let n = config.n_samples as f32;
    let mut accel_err = accel_sum / n;
    accel_err.z -= 1.0;

    Ok(CalibrationOffsets {
        accel_err,
        gyro_err: gyro_sum / n,
    })
}

/// Load stored offsets, or measure and persist fresh ones
///
/// A stored record is returned unchanged. Otherwise offsets are sampled and
/// saved; a failed save is logged and the freshly measured offsets are still
/// returned, so the run proceeds with in-memory calibration.
///
/// # Errors
///
/// Returns [`CalibrationError`] only for acquisition failures.
pub async fn load_or_calibrate<I, D, Fut, S>(
    imu: &mut I,
    delay_us: D,
    store: &mut S,
    config: &CalibrationConfig,
) -> Result<CalibrationOffsets, CalibrationError>
where
    I: ImuSensor,
    D: FnMut(u64) -> Fut,
    Fut: Future<Output = ()>,
    S: CalibrationStore,
{
    if let Some(offsets) = store.try_load() {
        crate::log_info!("calibration loaded from store");
        return Ok(offsets);
    }

    crate::log_info!(
        "no stored calibration, averaging {} samples",
        config.n_samples
    );
    let offsets = sample_offsets(imu, delay_us, config).await?;

    if let Err(e) = store.save(&offsets) {
        crate::log_warn!("calibration save failed, continuing in memory: {:?}", e);
    }

    Ok(offsets)
}
