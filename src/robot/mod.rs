//! Balance control loop
//!
//! Thin orchestration over the subsystems: once per tick, read a sample,
//! update the attitude estimate, drive the status LED from the balance
//! predicate, map roll to a servo command, then sleep out the remainder of
//! the fixed period. Timing is soft real-time: a late tick degrades `dt`
//! accuracy but never faults, because `dt` is measured from monotonic time.
//!
//! All mutable state is owned by the single loop; ticks are strictly
//! ordered.

use crate::core::traits::TimeSource;
use crate::devices::traits::{ImuError, ImuSample, ImuSensor};
use crate::platform::traits::{GpioInterface, PwmInterface};
use crate::platform::PlatformError;
use crate::subsystems::attitude::{
    Attitude, CalibrationConfig, CalibrationOffsets, ComplementaryFilter, FilterConfig,
};
use crate::subsystems::control::{command_to_duty, is_balanced, ServoConfig, ServoMapper};
use core::fmt;
use core::future::Future;

/// Ticks between periodic statistics log lines
const STATS_LOG_INTERVAL: u64 = 500;

/// Balance loop configuration
#[derive(Debug, Clone, Copy)]
pub struct BalanceConfig {
    /// Control period in microseconds (default: 20 000, i.e. 50 Hz)
    pub loop_period_us: u64,

    /// Servo mapping configuration
    pub servo: ServoConfig,

    /// Filter tuning
    pub filter: FilterConfig,

    /// Calibration acquisition settings
    pub calibration: CalibrationConfig,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            loop_period_us: 20_000,
            servo: ServoConfig::default(),
            filter: FilterConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

/// Errors that stop a balance run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BalanceError {
    /// A sensor read failed; actuation stops rather than emit a command
    /// derived from stale data
    Sensor(ImuError),
    /// An actuator or indicator write failed
    Platform(PlatformError),
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceError::Sensor(e) => write!(f, "sensor read failed: {:?}", e),
            BalanceError::Platform(e) => write!(f, "platform write failed: {}", e),
        }
    }
}

/// Per-run tick accounting
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopStats {
    /// Ticks executed
    pub ticks: u64,

    /// Last tick's execution time in microseconds
    pub last_execution_us: u32,

    /// Longest tick observed in microseconds
    pub max_execution_us: u32,

    /// Ticks that ran longer than the period (sleep skipped, not fatal)
    pub overruns: u32,
}

impl LoopStats {
    /// Record one tick's measured execution time
    pub fn record(&mut self, execution_us: u64, period_us: u64) {
        self.ticks = self.ticks.saturating_add(1);

        let execution = execution_us.min(u32::MAX as u64) as u32;
        self.last_execution_us = execution;
        if execution > self.max_execution_us {
            self.max_execution_us = execution;
        }

        if execution_us > period_us {
            self.overruns = self.overruns.saturating_add(1);
        }
    }
}

/// One robot's balance state: estimator, mapper, statistics
///
/// Separated from the driving loop so tests can feed ticks directly.
pub struct Balancer {
    filter: ComplementaryFilter,
    mapper: ServoMapper,
    stats: LoopStats,
}

impl Balancer {
    /// Create balance state.
    ///
    /// `now_us` seeds the filter's monotonic cursor.
    pub fn new(config: &BalanceConfig, offsets: CalibrationOffsets, now_us: u64) -> Self {
        Self {
            filter: ComplementaryFilter::with_config(offsets, config.filter, now_us),
            mapper: ServoMapper::new(config.servo),
            stats: LoopStats::default(),
        }
    }

    /// Run one estimate-indicate-actuate step.
    ///
    /// The LED toggles while the robot is balanced and is held low
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::Platform`] if an LED or servo write fails.
    pub fn tick<P, L>(
        &mut self,
        sample: &ImuSample,
        now_us: u64,
        servo: &mut P,
        led: &mut L,
    ) -> Result<Attitude, BalanceError>
    where
        P: PwmInterface,
        L: GpioInterface,
    {
        let attitude = self.filter.update(sample, now_us, true);

        if is_balanced(attitude.roll, attitude.pitch) {
            led.toggle().map_err(BalanceError::Platform)?;
        } else {
            led.set_low().map_err(BalanceError::Platform)?;
        }

        let command = self.mapper.map(attitude.roll);
        servo
            .set_duty_cycle(command_to_duty(command))
            .map_err(BalanceError::Platform)?;

        Ok(attitude)
    }

    /// Record one tick's execution time against the configured period
    pub fn record_execution(&mut self, execution_us: u64, period_us: u64) {
        self.stats.record(execution_us, period_us);
    }

    /// Accumulated tick statistics
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }
}

/// Drive the balance loop until a fatal error.
///
/// Runs one tick per `config.loop_period_us`, sleeping out the remainder of
/// each period through the injected delay. On a sensor failure the servo
/// output is disabled before returning; no command is derived from a failed
/// read.
///
/// # Errors
///
/// Returns [`BalanceError`] for the fault that stopped the run; the loop has
/// no normal exit.
pub async fn run_balance_task<I, P, L, T, D, Fut>(
    imu: &mut I,
    servo: &mut P,
    led: &mut L,
    time: &T,
    mut delay_us: D,
    config: &BalanceConfig,
    offsets: CalibrationOffsets,
) -> Result<(), BalanceError>
where
    I: ImuSensor,
    P: PwmInterface,
    L: GpioInterface,
    T: TimeSource,
    D: FnMut(u64) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut balancer = Balancer::new(config, offsets, time.now_us());
    servo.enable();
    crate::log_info!("balance loop started, period {} us", config.loop_period_us);

    loop {
        let tick_start = time.now_us();

        let sample = match imu.read_sample().await {
            Ok(sample) => sample,
            Err(e) => {
                crate::log_error!("sensor read failed, stopping actuation: {:?}", e);
                servo.disable();
                let _ = led.set_low();
                return Err(BalanceError::Sensor(e));
            }
        };

        if let Err(e) = balancer.tick(&sample, time.now_us(), servo, led) {
            crate::log_error!("tick failed, stopping actuation: {:?}", e);
            servo.disable();
            return Err(e);
        }

        let execution_us = time.elapsed_since(tick_start);
        balancer.record_execution(execution_us, config.loop_period_us);

        let stats = balancer.stats();
        if stats.ticks % STATS_LOG_INTERVAL == 0 {
            crate::log_debug!(
                "balance: {} ticks, last {} us, max {} us, {} overruns",
                stats.ticks,
                stats.last_execution_us,
                stats.max_execution_us,
                stats.overruns
            );
        }

        if execution_us < config.loop_period_us {
            delay_us(config.loop_period_us - execution_us).await;
        }
    }
}
