//! Mock IMU implementation for testing
//!
//! Provides a configurable mock sensor implementing [`ImuSensor`]: a queue
//! of preset samples, a default sample for when the queue runs dry, and a
//! health flag for exercising error paths.

use crate::devices::traits::{ImuError, ImuSample, ImuSensor};

/// Mock IMU for testing
pub struct MockImu {
    /// Queue of samples to return
    samples: heapless::Deque<ImuSample, 64>,

    /// Default sample when the queue is empty
    default_sample: ImuSample,

    /// Health status; unhealthy reads fail with `BusError`
    healthy: bool,

    /// Number of successful reads
    read_count: u32,

    /// Fail reads after this many successes (for loop-stop tests)
    fail_after: Option<u32>,
}

impl MockImu {
    /// Create a mock IMU that always returns the default sample
    pub fn with_default_sample() -> Self {
        Self {
            samples: heapless::Deque::new(),
            default_sample: ImuSample::default(),
            healthy: true,
            read_count: 0,
            fail_after: None,
        }
    }

    /// Create a mock IMU with a sequence of samples
    pub fn with_samples(samples: &[ImuSample]) -> Self {
        let mut deque = heapless::Deque::new();
        for sample in samples.iter().take(64) {
            let _ = deque.push_back(*sample);
        }

        Self {
            samples: deque,
            default_sample: ImuSample::default(),
            healthy: true,
            read_count: 0,
            fail_after: None,
        }
    }

    /// Set the sample returned when the queue is empty
    pub fn set_default_sample(&mut self, sample: ImuSample) {
        self.default_sample = sample;
    }

    /// Push a sample onto the queue
    pub fn push_sample(&mut self, sample: ImuSample) -> Result<(), ImuSample> {
        self.samples.push_back(sample)
    }

    /// Set health status (for error-path tests)
    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }

    /// Make reads fail after `n` successful reads
    pub fn fail_after(&mut self, n: u32) {
        self.fail_after = Some(n);
    }

    /// Number of successful reads so far
    pub fn read_count(&self) -> u32 {
        self.read_count
    }
}

impl ImuSensor for MockImu {
    async fn read_sample(&mut self) -> Result<ImuSample, ImuError> {
        if !self.healthy {
            return Err(ImuError::BusError);
        }
        if let Some(limit) = self.fail_after {
            if self.read_count >= limit {
                return Err(ImuError::BusError);
            }
        }

        self.read_count += 1;
        Ok(self.samples.pop_front().unwrap_or(self.default_sample))
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}
