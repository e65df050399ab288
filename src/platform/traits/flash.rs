//! Flash interface trait
//!
//! Durable storage behind calibration persistence.

use crate::platform::Result;

/// Flash storage interface
///
/// # Flash Characteristics
///
/// - Organized in blocks (4 KB on RP2040/RP2350)
/// - Erase sets all bytes to 0xFF
/// - Writes can only change bits from 1 to 0 (erase first to reset)
///
/// # Safety Invariants
///
/// - One owner per Flash instance, no concurrent access
/// - Implementations must reject addresses inside the firmware region
pub trait FlashInterface {
    /// Read `buf.len()` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the
    /// range is out of bounds, `FlashError::ReadFailed` on a failed read.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `address`.
    ///
    /// The target region must have been erased first; writing only clears
    /// bits.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the
    /// range is protected or out of bounds, `FlashError::WriteFailed` on a
    /// failed write.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `address`, setting them to 0xFF.
    ///
    /// `address` must be block-aligned and `size` a multiple of the block
    /// size.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` on
    /// misalignment or a protected range, `FlashError::EraseFailed` on a
    /// failed erase.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Minimum erasable unit size in bytes.
    fn block_size(&self) -> u32;

    /// Total Flash capacity in bytes.
    fn capacity(&self) -> u32;
}
