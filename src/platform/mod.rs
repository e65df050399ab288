//! Platform abstraction layer
//!
//! Hardware access is isolated behind the traits in this module. Board
//! implementations (RP2040 PWM slices, onboard LED, XIP flash) live in
//! firmware crates; the mock implementations here back the host test suite.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{PlatformError, Result};
pub use traits::{FlashInterface, GpioInterface, PwmInterface};
