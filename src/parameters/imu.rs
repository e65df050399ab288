//! IMU calibration parameters
//!
//! Maps the calibration record onto six named float parameters and provides
//! the flash-backed [`CalibrationStore`] the startup sequence uses.

use crate::parameters::persist::FlashParamStorage;
use crate::parameters::storage::{ParamFlags, ParamValue, ParameterError, ParameterStore};
use crate::platform::traits::FlashInterface;
use crate::subsystems::attitude::{CalibrationOffsets, CalibrationStore, StoreError};
use nalgebra::Vector3;

/// Parameter names for the calibration record
pub const PARAM_ACC_ERR_X: &str = "IMU_ACC_ERR_X";
pub const PARAM_ACC_ERR_Y: &str = "IMU_ACC_ERR_Y";
pub const PARAM_ACC_ERR_Z: &str = "IMU_ACC_ERR_Z";

pub const PARAM_GYR_ERR_X: &str = "IMU_GYR_ERR_X";
pub const PARAM_GYR_ERR_Y: &str = "IMU_GYR_ERR_Y";
pub const PARAM_GYR_ERR_Z: &str = "IMU_GYR_ERR_Z";

/// All six names, in record order
const OFFSET_PARAMS: [&str; 6] = [
    PARAM_ACC_ERR_X,
    PARAM_ACC_ERR_Y,
    PARAM_ACC_ERR_Z,
    PARAM_GYR_ERR_X,
    PARAM_GYR_ERR_Y,
    PARAM_GYR_ERR_Z,
];

/// Write a calibration record into a parameter store
///
/// # Errors
///
/// Returns [`ParameterError`] if the store cannot hold the record.
pub fn store_offsets(
    store: &mut ParameterStore,
    offsets: &CalibrationOffsets,
) -> Result<(), ParameterError> {
    let values = [
        offsets.accel_err.x,
        offsets.accel_err.y,
        offsets.accel_err.z,
        offsets.gyro_err.x,
        offsets.gyro_err.y,
        offsets.gyro_err.z,
    ];

    for (name, value) in OFFSET_PARAMS.into_iter().zip(values) {
        store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
        store.set(name, ParamValue::Float(value))?;
    }
    Ok(())
}

/// Read a calibration record from a parameter store
///
/// Returns `None` unless all six parameters are present as floats; a partial
/// record is treated as absent.
pub fn fetch_offsets(store: &ParameterStore) -> Option<CalibrationOffsets> {
    let mut values = [0.0f32; 6];
    for (slot, name) in values.iter_mut().zip(OFFSET_PARAMS) {
        match store.get(name) {
            Some(ParamValue::Float(v)) => *slot = v,
            _ => return None,
        }
    }

    Some(CalibrationOffsets {
        accel_err: Vector3::new(values[0], values[1], values[2]),
        gyro_err: Vector3::new(values[3], values[4], values[5]),
    })
}

/// Flash-backed calibration store
///
/// Persists the six offsets through the text parameter block.
pub struct FlashCalibrationStore<F: FlashInterface> {
    storage: FlashParamStorage<F>,
}

impl<F: FlashInterface> FlashCalibrationStore<F> {
    /// Create a store owning the flash interface
    pub fn new(flash: F) -> Self {
        Self {
            storage: FlashParamStorage::new(flash),
        }
    }

    /// Release the flash interface
    pub fn into_inner(self) -> F {
        self.storage.into_inner()
    }
}

impl<F: FlashInterface> CalibrationStore for FlashCalibrationStore<F> {
    fn try_load(&mut self) -> Option<CalibrationOffsets> {
        let mut store = ParameterStore::new();
        match self.storage.load(&mut store) {
            Ok(true) => fetch_offsets(&store),
            Ok(false) => None,
            Err(e) => {
                crate::log_warn!("calibration load failed: {:?}", e);
                None
            }
        }
    }

    fn save(&mut self, offsets: &CalibrationOffsets) -> Result<(), StoreError> {
        let mut store = ParameterStore::new();
        store_offsets(&mut store, offsets).map_err(|_| StoreError::Full)?;
        self.storage
            .save(&mut store)
            .map_err(|_| StoreError::WriteFailed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;

    fn sample_offsets() -> CalibrationOffsets {
        CalibrationOffsets {
            accel_err: Vector3::new(0.0123, -0.0456, 0.0789),
            gyro_err: Vector3::new(-1.25, 0.5, 0.0625),
        }
    }

    #[test]
    fn store_and_fetch_roundtrip() {
        let mut store = ParameterStore::new();
        let offsets = sample_offsets();
        store_offsets(&mut store, &offsets).unwrap();
        assert_eq!(fetch_offsets(&store), Some(offsets));
    }

    #[test]
    fn partial_record_is_absent() {
        let mut store = ParameterStore::new();
        store_offsets(&mut store, &sample_offsets()).unwrap();

        let mut partial = ParameterStore::new();
        for (name, value) in store.iter_all().take(5) {
            partial.insert_raw(name.clone(), value);
        }
        assert_eq!(fetch_offsets(&partial), None);
    }

    #[test]
    fn empty_store_is_absent() {
        assert_eq!(fetch_offsets(&ParameterStore::new()), None);
    }

    #[test]
    fn flash_store_roundtrip_is_exact() {
        let mut store = FlashCalibrationStore::new(MockFlash::new());
        assert_eq!(store.try_load(), None);

        let offsets = sample_offsets();
        store.save(&offsets).unwrap();

        let loaded = store.try_load().unwrap();
        assert_eq!(
            loaded.accel_err.x.to_bits(),
            offsets.accel_err.x.to_bits()
        );
        assert_eq!(loaded, offsets);
    }

    #[test]
    fn corrupt_flash_is_absent() {
        let mut flash = MockFlash::new();
        flash.inject_corruption(crate::parameters::persist::PARAM_BLOCK_BASE, 16);
        let mut store = FlashCalibrationStore::new(flash);
        assert_eq!(store.try_load(), None);
    }
}
