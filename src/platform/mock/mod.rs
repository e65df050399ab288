//! Mock platform implementations for host testing

pub mod flash;
pub mod gpio;
pub mod pwm;

pub use flash::MockFlash;
pub use gpio::MockGpio;
pub use pwm::MockPwm;
