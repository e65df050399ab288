//! Platform trait definitions

pub mod flash;
pub mod gpio;
pub mod pwm;

pub use flash::FlashInterface;
pub use gpio::{GpioInterface, GpioMode};
pub use pwm::{PwmConfig, PwmInterface};
