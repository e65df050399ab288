//! Complementary-filter roll/pitch estimator
//!
//! Fuses two imperfect tilt references: integrated gyro rates (smooth but
//! drifting) and accelerometer-derived tilt (drift-free but noisy under
//! vibration). Each update blends them as a convex combination weighted
//! heavily toward the gyro branch, so short-term motion follows the gyro
//! while the accelerometer anchors the long-term mean.
//!
//! Yaw cannot be observed against gravity, so it is only dead-reckoned
//! internally and never corrected or exposed.

use super::calibration::CalibrationOffsets;
use crate::devices::traits::ImuSample;
use libm::{atan2f, sinf, sqrtf};

/// Gyro-branch weight in percent (99 = 0.99 on the integrated branch)
const DEFAULT_BLEND_PC: f32 = 99.0;

/// Filter tuning
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    /// Percent weight on the gyro-integrated branch of the blend
    pub pc: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pc: DEFAULT_BLEND_PC,
        }
    }
}

/// One attitude estimate, produced once per control tick
#[derive(Debug, Clone, Copy)]
pub struct Attitude {
    /// Fused roll in degrees
    pub roll: f32,

    /// Fused pitch in degrees
    pub pitch: f32,

    /// Measured time since the previous update in seconds
    pub dt: f32,
}

/// Complementary filter with explicit owned state
///
/// Construct one per robot; updates must arrive in order (the blend is
/// state-dependent). The first update, and any update with
/// `in_loop == false`, seeds the estimate from the accelerometer alone,
/// discarding the filter memory.
pub struct ComplementaryFilter {
    offsets: CalibrationOffsets,
    config: FilterConfig,
    comp_roll: Option<f32>,
    comp_pitch: Option<f32>,
    /// Dead-reckoned yaw in degrees; never corrected, never read downstream
    gyro_yaw: f32,
    /// Monotonic cursor for dt measurement
    last_update_us: u64,
}

impl ComplementaryFilter {
    /// Create a filter with default tuning.
    ///
    /// `now_us` seeds the monotonic cursor so the first update measures real
    /// elapsed time.
    pub fn new(offsets: CalibrationOffsets, now_us: u64) -> Self {
        Self::with_config(offsets, FilterConfig::default(), now_us)
    }

    /// Create a filter with explicit tuning.
    pub fn with_config(offsets: CalibrationOffsets, config: FilterConfig, now_us: u64) -> Self {
        Self {
            offsets,
            config,
            comp_roll: None,
            comp_pitch: None,
            gyro_yaw: 0.0,
            last_update_us: now_us,
        }
    }

    /// Fused roll in degrees, if at least one update has run.
    pub fn roll(&self) -> Option<f32> {
        self.comp_roll
    }

    /// Fused pitch in degrees, if at least one update has run.
    pub fn pitch(&self) -> Option<f32> {
        self.comp_pitch
    }

    /// Advance the filter by one sample.
    ///
    /// `now_us` is monotonic time; `dt` is measured from the previous call,
    /// not assumed equal to the nominal control period. With
    /// `in_loop == false` the estimate re-seeds from the accelerometer,
    /// which callers use to reset drift after a known-level state.
    pub fn update(&mut self, sample: &ImuSample, now_us: u64, in_loop: bool) -> Attitude {
        let dt = now_us.saturating_sub(self.last_update_us) as f32 / 1_000_000.0;
        self.last_update_us = now_us;

        // Bias-correct all six axes
        let accel = sample.accel - self.offsets.accel_err;
        let gyro = sample.gyro - self.offsets.gyro_err;

        // Per-tick gyro angle increments [deg], rates are already deg/s
        let gyro_x_angle = gyro.x * dt;
        let gyro_y_angle = gyro.y * dt;
        let gyro_z_angle = gyro.z * dt;

        // Accelerometer-only tilt [deg]
        let mut roll =
            atan2f(accel.y, sqrtf(accel.x * accel.x + accel.z * accel.z)).to_degrees();
        let mut pitch =
            atan2f(-accel.x, sqrtf(accel.y * accel.y + accel.z * accel.z)).to_degrees();

        // Small-angle yaw coupling correction. Order matters: roll uses the
        // uncorrected pitch, pitch then uses the corrected roll.
        roll -= pitch * sinf(gyro_z_angle);
        pitch += roll * sinf(gyro_z_angle);

        self.gyro_yaw += gyro_z_angle;

        let weight = self.config.pc / 100.0;
        let (comp_roll, comp_pitch) = match (self.comp_roll, self.comp_pitch) {
            (Some(prev_roll), Some(prev_pitch)) if in_loop => (
                weight * (prev_roll + gyro_x_angle) + (1.0 - weight) * roll,
                weight * (prev_pitch + gyro_y_angle) + (1.0 - weight) * pitch,
            ),
            _ => (roll, pitch),
        };

        self.comp_roll = Some(comp_roll);
        self.comp_pitch = Some(comp_pitch);

        Attitude {
            roll: comp_roll,
            pitch: comp_pitch,
            dt,
        }
    }
}
