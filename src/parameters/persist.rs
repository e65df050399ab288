//! Flash parameter persistence
//!
//! Writes the parameter store to a flash block as a line-based text record:
//!
//! ```text
//! pico_poise-params v1
//! IMU_ACC_ERR_X=f:0.0123
//! IMU_CAL_SAVED=b:true
//! ```
//!
//! The format is human-inspectable and round-trip exact: floats are written
//! with shortest round-trip formatting and re-parsed with `str::parse`. A
//! block without the magic header, or with any malformed line, loads as
//! "not present" rather than failing the boot.

use crate::parameters::storage::{ParamValue, ParameterStore, PARAM_NAME_LEN};
use crate::platform::{error::FlashError, traits::FlashInterface, Result};
use core::fmt::Write;
use heapless::String;

/// Flash offset of the parameter block (past the firmware region)
pub const PARAM_BLOCK_BASE: u32 = 0x040000;

/// Parameter block size (one erase block)
pub const PARAM_BLOCK_SIZE: usize = 4096;

/// First line of a valid parameter block
const MAGIC_LINE: &str = "pico_poise-params v1";

/// Flash-backed parameter persistence
pub struct FlashParamStorage<F: FlashInterface> {
    flash: F,
}

impl<F: FlashInterface> FlashParamStorage<F> {
    /// Create a storage instance owning the flash interface
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Release the flash interface
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Serialize the store and write it to the parameter block.
    ///
    /// Clears the store's dirty flag on success.
    ///
    /// # Errors
    ///
    /// Returns a flash error if the record does not fit the block or the
    /// erase/write fails.
    pub fn save(&mut self, store: &mut ParameterStore) -> Result<()> {
        let mut text: String<PARAM_BLOCK_SIZE> = String::new();
        writeln!(text, "{}", MAGIC_LINE).map_err(|_| FlashError::WriteFailed)?;

        for (name, value) in store.iter_all() {
            match value {
                ParamValue::Bool(b) => writeln!(text, "{}=b:{}", name, b),
                ParamValue::Int(i) => writeln!(text, "{}=i:{}", name, i),
                ParamValue::Float(x) => writeln!(text, "{}=f:{}", name, x),
            }
            .map_err(|_| FlashError::WriteFailed)?;
        }

        self.flash.erase(PARAM_BLOCK_BASE, self.flash.block_size())?;
        self.flash.write(PARAM_BLOCK_BASE, text.as_bytes())?;

        store.clear_dirty();
        Ok(())
    }

    /// Read the parameter block into `store`.
    ///
    /// Returns `Ok(true)` if a valid record was loaded, `Ok(false)` if the
    /// block is absent or unreadable as a record (the store is then left
    /// untouched).
    ///
    /// # Errors
    ///
    /// Returns a flash error only for a failed read; corruption is not an
    /// error.
    pub fn load(&mut self, store: &mut ParameterStore) -> Result<bool> {
        let mut buf = [0u8; PARAM_BLOCK_SIZE];
        self.flash.read(PARAM_BLOCK_BASE, &mut buf)?;

        // Erased flash is 0xFF; the record ends at the first erased byte.
        let end = buf.iter().position(|&b| b == 0xFF).unwrap_or(buf.len());
        let text = match core::str::from_utf8(&buf[..end]) {
            Ok(text) => text,
            Err(_) => {
                crate::log_warn!("parameter block is not valid text, ignoring");
                return Ok(false);
            }
        };

        let mut lines = text.lines();
        if lines.next() != Some(MAGIC_LINE) {
            return Ok(false);
        }

        let mut loaded = ParameterStore::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                Some((name, value)) => loaded.insert_raw(name, value),
                None => {
                    crate::log_warn!("malformed parameter line, ignoring block");
                    return Ok(false);
                }
            }
        }

        *store = loaded;
        Ok(true)
    }
}

/// Parse one `NAME=<tag>:<value>` line
fn parse_line(line: &str) -> Option<(String<PARAM_NAME_LEN>, ParamValue)> {
    let (name, rest) = line.split_once('=')?;
    let (tag, value) = rest.split_once(':')?;

    let value = match tag {
        "b" => ParamValue::Bool(value.parse().ok()?),
        "i" => ParamValue::Int(value.parse().ok()?),
        "f" => ParamValue::Float(value.parse().ok()?),
        _ => return None,
    };

    let key = String::try_from(name).ok()?;
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::storage::ParamFlags;
    use crate::platform::mock::MockFlash;

    fn store_with(values: &[(&str, ParamValue)]) -> ParameterStore {
        let mut store = ParameterStore::new();
        for (name, value) in values {
            store.register(name, *value, ParamFlags::empty()).unwrap();
        }
        store
    }

    #[test]
    fn save_then_load_roundtrips() {
        let mut storage = FlashParamStorage::new(MockFlash::new());
        let mut store = store_with(&[
            ("IMU_ACC_ERR_X", ParamValue::Float(0.012345678)),
            ("LOOP_RATE", ParamValue::Int(-50)),
            ("CAL_SAVED", ParamValue::Bool(true)),
        ]);

        storage.save(&mut store).unwrap();
        assert!(!store.is_dirty());

        let mut loaded = ParameterStore::new();
        assert!(storage.load(&mut loaded).unwrap());
        assert_eq!(loaded.get("IMU_ACC_ERR_X"), Some(ParamValue::Float(0.012345678)));
        assert_eq!(loaded.get("LOOP_RATE"), Some(ParamValue::Int(-50)));
        assert_eq!(loaded.get("CAL_SAVED"), Some(ParamValue::Bool(true)));
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn float_roundtrip_is_bit_exact() {
        // Awkward values that do not have short decimal expansions.
        let values = [
            0.1_f32,
            -3.0e-8,
            1.0 / 3.0,
            f32::MIN_POSITIVE,
            123456.78,
            -0.049999997,
        ];

        for (i, &v) in values.iter().enumerate() {
            let mut storage = FlashParamStorage::new(MockFlash::new());
            let mut store = store_with(&[("VAL", ParamValue::Float(v))]);
            storage.save(&mut store).unwrap();

            let mut loaded = ParameterStore::new();
            assert!(storage.load(&mut loaded).unwrap());
            match loaded.get("VAL") {
                Some(ParamValue::Float(back)) => {
                    assert_eq!(back.to_bits(), v.to_bits(), "case {}", i)
                }
                other => panic!("expected float, got {:?}", other),
            }
        }
    }

    #[test]
    fn erased_flash_loads_as_absent() {
        let mut storage = FlashParamStorage::new(MockFlash::new());
        let mut store = ParameterStore::new();
        assert!(!storage.load(&mut store).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_block_loads_as_absent() {
        let mut flash = MockFlash::new();
        flash.inject_corruption(PARAM_BLOCK_BASE, 64);
        let mut storage = FlashParamStorage::new(flash);

        let mut store = ParameterStore::new();
        assert!(!storage.load(&mut store).unwrap());
    }

    #[test]
    fn malformed_line_discards_block() {
        let mut flash = MockFlash::new();
        flash.erase(PARAM_BLOCK_BASE, 4096).unwrap();
        flash
            .write(PARAM_BLOCK_BASE, b"pico_poise-params v1\nBROKEN LINE\n")
            .unwrap();
        let mut storage = FlashParamStorage::new(flash);

        let mut store = ParameterStore::new();
        assert!(!storage.load(&mut store).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn wrong_magic_loads_as_absent() {
        let mut flash = MockFlash::new();
        flash.erase(PARAM_BLOCK_BASE, 4096).unwrap();
        flash
            .write(PARAM_BLOCK_BASE, b"other-format v9\nA=i:1\n")
            .unwrap();
        let mut storage = FlashParamStorage::new(flash);

        let mut store = ParameterStore::new();
        assert!(!storage.load(&mut store).unwrap());
    }

    #[test]
    fn record_is_human_readable() {
        let mut storage = FlashParamStorage::new(MockFlash::new());
        let mut store = store_with(&[("ANSWER", ParamValue::Int(42))]);
        storage.save(&mut store).unwrap();

        let flash = storage.into_inner();
        let bytes = flash.contents(PARAM_BLOCK_BASE, 64);
        let end = bytes.iter().position(|&b| b == 0xFF).unwrap();
        let text = core::str::from_utf8(&bytes[..end]).unwrap();
        assert_eq!(text, "pico_poise-params v1\nANSWER=i:42\n");
    }

    #[test]
    fn save_overwrites_previous_record() {
        let mut storage = FlashParamStorage::new(MockFlash::new());

        let mut first = store_with(&[("A", ParamValue::Int(1)), ("B", ParamValue::Int(2))]);
        storage.save(&mut first).unwrap();

        let mut second = store_with(&[("A", ParamValue::Int(9))]);
        storage.save(&mut second).unwrap();

        let mut loaded = ParameterStore::new();
        assert!(storage.load(&mut loaded).unwrap());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("A"), Some(ParamValue::Int(9)));
        assert_eq!(loaded.get("B"), None);
    }
}
