//! IMU device implementations
//!
//! Hardware drivers implement [`crate::devices::traits::ImuSensor`] in
//! firmware crates; only the mock lives here.

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockImu;
