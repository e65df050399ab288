//! Actuation mapping
//!
//! Maps the fused roll estimate onto the servo's duty-count range and keeps
//! the previous command around for an optional smoothing blend. This is a
//! clamped proportional map, not a PID: ±90° of roll covers the full
//! actuator range, centered at level.

use libm::roundf;

/// Tilt threshold for the balance indicator, degrees (strict inequality)
pub const BALANCE_THRESHOLD_DEG: f32 = 5.0;

/// Servo output configuration
///
/// The range is in 16-bit duty counts at the 50 Hz servo carrier; the
/// defaults span an SG90's 0°–180° throw.
#[derive(Debug, Clone, Copy)]
pub struct ServoConfig {
    /// Lowest command the actuator accepts (default: 1600)
    pub range_low: u16,

    /// Highest command the actuator accepts (default: 8400)
    pub range_high: u16,

    /// Weight of the previous command in the output blend, in [0.0, 1.0).
    /// The fresh target gets `1 - smoothing`. The default of 0.0 applies no
    /// smoothing; the blend exists for tuning.
    pub smoothing: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            range_low: 1600,
            range_high: 8400,
            smoothing: 0.0,
        }
    }
}

impl ServoConfig {
    /// Command counts per degree of roll (±90° spans the full range)
    fn factor(&self) -> f32 {
        (self.range_high - self.range_low) as f32 / 180.0
    }

    /// Centered command for zero roll
    pub fn neutral(&self) -> f32 {
        self.range_low as f32 + (self.range_high - self.range_low) as f32 / 2.0
    }
}

/// Roll-to-command mapper with blend state
///
/// Owns the last emitted command; starts with none, so the first tick passes
/// the raw target through unsmoothed.
pub struct ServoMapper {
    config: ServoConfig,
    last_command: Option<u16>,
}

impl ServoMapper {
    /// Create a mapper with the given configuration
    pub fn new(config: ServoConfig) -> Self {
        Self {
            config,
            last_command: None,
        }
    }

    /// Last emitted command, if any tick has run
    pub fn last_command(&self) -> Option<u16> {
        self.last_command
    }

    /// Map a roll estimate to a clamped actuator command.
    ///
    /// Clamping applies on every call, after the blend, so the actuator can
    /// never see an out-of-range command regardless of the weights.
    pub fn map(&mut self, comp_roll: f32) -> u16 {
        let low = self.config.range_low as f32;
        let high = self.config.range_high as f32;

        let target = roundf(-comp_roll * self.config.factor() + self.config.neutral())
            .clamp(low, high);

        let command = match self.last_command {
            None => target,
            Some(prev) => {
                let blended =
                    self.config.smoothing * prev as f32 + (1.0 - self.config.smoothing) * target;
                roundf(blended).clamp(low, high)
            }
        };

        let command = command as u16;
        self.last_command = Some(command);
        command
    }
}

/// Convert a duty-count command to a PWM duty-cycle fraction
///
/// Commands are 16-bit duty counts (65535 = 100%).
pub fn command_to_duty(command: u16) -> f32 {
    command as f32 / 65535.0
}

/// Balance indicator predicate: both tilt angles strictly inside the
/// threshold.
pub fn is_balanced(comp_roll: f32, comp_pitch: f32) -> bool {
    comp_roll.abs() < BALANCE_THRESHOLD_DEG && comp_pitch.abs() < BALANCE_THRESHOLD_DEG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_throw_maps_to_range_ends() {
        let mut mapper = ServoMapper::new(ServoConfig::default());
        assert_eq!(mapper.map(90.0), 1600);

        let mut mapper = ServoMapper::new(ServoConfig::default());
        assert_eq!(mapper.map(-90.0), 8400);
    }

    #[test]
    fn level_maps_to_midpoint() {
        let mut mapper = ServoMapper::new(ServoConfig::default());
        assert_eq!(mapper.map(0.0), 5000);
    }

    #[test]
    fn out_of_range_roll_is_clamped() {
        for roll in [90.5, 120.0, 500.0] {
            let mut mapper = ServoMapper::new(ServoConfig::default());
            assert_eq!(mapper.map(roll), 1600);
            assert_eq!(mapper.map(-roll), 8400);
        }
    }

    #[test]
    fn default_blend_is_passthrough() {
        let mut mapper = ServoMapper::new(ServoConfig::default());
        mapper.map(90.0);
        // With smoothing 0.0 the previous command has no influence.
        assert_eq!(mapper.map(0.0), 5000);
        assert_eq!(mapper.last_command(), Some(5000));
    }

    #[test]
    fn smoothing_blends_with_previous_command() {
        let config = ServoConfig {
            smoothing: 0.5,
            ..Default::default()
        };
        let mut mapper = ServoMapper::new(config);

        // First tick: no previous command, target passes through.
        assert_eq!(mapper.map(90.0), 1600);
        // Second tick: 0.5 * 1600 + 0.5 * 5000 = 3300.
        assert_eq!(mapper.map(0.0), 3300);
    }

    #[test]
    fn blended_output_stays_clamped() {
        let config = ServoConfig {
            smoothing: 0.9,
            ..Default::default()
        };
        let mut mapper = ServoMapper::new(config);
        mapper.map(-90.0);
        let command = mapper.map(90.0);
        assert!((1600..=8400).contains(&command));
    }

    #[test]
    fn command_to_duty_fraction() {
        assert!((command_to_duty(0) - 0.0).abs() < 1e-6);
        assert!((command_to_duty(65535) - 1.0).abs() < 1e-6);
        // Neutral command at the 50 Hz carrier is ~7.6% duty.
        assert!((command_to_duty(5000) - 0.0763).abs() < 1e-3);
    }

    #[test]
    fn balance_predicate_strict_boundary() {
        assert!(is_balanced(4.9, 4.9));
        assert!(is_balanced(-4.9, 4.9));
        assert!(!is_balanced(5.0, 0.0));
        assert!(!is_balanced(0.0, 5.0));
        assert!(!is_balanced(-5.0, 0.0));
    }
}
