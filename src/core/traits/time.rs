//! Time abstraction for control-loop timing.
//!
//! The balance loop and the attitude filter measure elapsed time through
//! [`TimeSource`] instead of reading a hardware timer directly, so the same
//! code runs under an Embassy instant provider on the target and under
//! [`MockTime`] in host tests.

use core::cell::Cell;

/// Platform-agnostic monotonic time source.
///
/// Implementations must be monotonic and never reset while the robot is
/// running; `dt` computations assume time only moves forward.
pub trait TimeSource: Clone {
    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Uses saturating subtraction so a stale reference cannot underflow.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// Mock time source with controllable advancement.
///
/// Lets tests drive timing-dependent code deterministically.
///
/// # Example
///
/// ```
/// use pico_poise::core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// time.advance(20_000); // one 20 ms tick
/// assert_eq!(time.now_ms(), 20);
/// ```
#[derive(Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

impl MockTime {
    /// Creates a mock time source starting at time 0.
    pub fn new() -> Self {
        Self {
            current_us: Cell::new(0),
        }
    }

    /// Creates a mock time source starting at the given time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the current time by the given amount.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_us.get() / 1000
    }

    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let time = MockTime::new();
        assert_eq!(time.now_us(), 0);
        assert_eq!(time.now_ms(), 0);
    }

    #[test]
    fn with_initial_value() {
        let time = MockTime::with_initial(5_000_000);
        assert_eq!(time.now_us(), 5_000_000);
        assert_eq!(time.now_ms(), 5000);
    }

    #[test]
    fn set_and_advance() {
        let time = MockTime::new();
        time.set(1_000);
        time.advance(500);
        assert_eq!(time.now_us(), 1_500);
    }

    #[test]
    fn elapsed_since_reference() {
        let time = MockTime::new();
        time.set(10_000);
        assert_eq!(time.elapsed_since(3_000), 7_000);
    }

    #[test]
    fn elapsed_since_saturates() {
        let time = MockTime::new();
        time.set(1_000);
        // Reference in the "future" saturates to zero.
        assert_eq!(time.elapsed_since(5_000), 0);
    }

    #[test]
    fn millisecond_conversion_rounds_down() {
        let time = MockTime::new();
        time.set(1_999);
        assert_eq!(time.now_ms(), 1);
    }
}
