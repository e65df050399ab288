//! Parameter storage types
//!
//! A bounded key/value store for runtime configuration. Flash persistence is
//! in [`crate::parameters::persist`].

use bitflags::bitflags;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Maximum parameter name length
pub const PARAM_NAME_LEN: usize = 16;

/// Maximum number of parameters
pub const MAX_PARAMS: usize = 32;

bitflags! {
    /// Parameter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Parameter cannot be modified through `set`
        const READ_ONLY = 0b00000001;
    }
}

/// Parameter value types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Boolean parameter
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 32-bit floating point
    Float(f32),
}

/// Errors from parameter store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterError {
    /// Unknown parameter or invalid name
    InvalidConfig,
    /// Store is full
    StoreFull,
    /// Read-only parameter cannot be modified
    ReadOnly,
}

impl core::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParameterError::InvalidConfig => write!(f, "invalid parameter configuration"),
            ParameterError::StoreFull => write!(f, "parameter store full"),
            ParameterError::ReadOnly => write!(f, "parameter is read-only"),
        }
    }
}

/// One registered parameter
#[derive(Debug, Clone, Copy)]
struct Param {
    value: ParamValue,
    flags: ParamFlags,
}

/// Bounded parameter store
///
/// Registration is idempotent; `set` only accepts known, writable names.
/// The dirty flag tracks unsaved changes for the persistence layer.
pub struct ParameterStore {
    parameters: FnvIndexMap<String<PARAM_NAME_LEN>, Param, MAX_PARAMS>,
    dirty: bool,
}

impl ParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            parameters: FnvIndexMap::new(),
            dirty: false,
        }
    }

    fn key(name: &str) -> Option<String<PARAM_NAME_LEN>> {
        let mut key = String::new();
        key.push_str(name).ok()?;
        Some(key)
    }

    /// Get a parameter value
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        let key = Self::key(name)?;
        self.parameters.get(&key).map(|p| p.value)
    }

    /// Set a parameter value
    ///
    /// Marks the store dirty.
    ///
    /// # Errors
    ///
    /// Rejects unknown names and read-only parameters.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = Self::key(name).ok_or(ParameterError::InvalidConfig)?;

        let param = self
            .parameters
            .get_mut(&key)
            .ok_or(ParameterError::InvalidConfig)?;
        if param.flags.contains(ParamFlags::READ_ONLY) {
            return Err(ParameterError::ReadOnly);
        }

        param.value = value;
        self.dirty = true;
        Ok(())
    }

    /// Register a parameter with a default value and flags
    ///
    /// A no-op if the name is already registered (the existing value wins).
    ///
    /// # Errors
    ///
    /// Returns `StoreFull` when the store has no room, `InvalidConfig` for an
    /// over-long name.
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
        flags: ParamFlags,
    ) -> Result<(), ParameterError> {
        let key = Self::key(name).ok_or(ParameterError::InvalidConfig)?;

        if self.parameters.contains_key(&key) {
            return Ok(());
        }

        self.parameters
            .insert(
                key,
                Param {
                    value: default_value,
                    flags,
                },
            )
            .map_err(|_| ParameterError::StoreFull)?;
        self.dirty = true;
        Ok(())
    }

    /// Insert a parameter without validation
    ///
    /// Used by the persistence layer when deserializing; flash contents are
    /// trusted, so read-only and existence checks do not apply.
    pub fn insert_raw(&mut self, name: String<PARAM_NAME_LEN>, value: ParamValue) {
        let param = Param {
            value,
            flags: ParamFlags::empty(),
        };
        self.parameters.insert(name, param).ok();
    }

    /// Iterate over all parameters as (name, value) pairs
    pub fn iter_all(&self) -> impl Iterator<Item = (&String<PARAM_NAME_LEN>, ParamValue)> {
        self.parameters.iter().map(|(name, p)| (name, p.value))
    }

    /// Number of registered parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check for unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag (after a successful save)
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty_and_clean() {
        let store = ParameterStore::new();
        assert!(store.is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn register_and_get() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get("TEST"), Some(ParamValue::Int(42)));
    }

    #[test]
    fn set_updates_and_dirties() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        store.clear_dirty();

        store.set("TEST", ParamValue::Int(100)).unwrap();
        assert_eq!(store.get("TEST"), Some(ParamValue::Int(100)));
        assert!(store.is_dirty());
    }

    #[test]
    fn set_unknown_is_rejected() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.set("UNKNOWN", ParamValue::Int(1)).unwrap_err(),
            ParameterError::InvalidConfig
        );
    }

    #[test]
    fn register_is_idempotent() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        store.set("TEST", ParamValue::Int(100)).unwrap();

        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get("TEST"), Some(ParamValue::Int(100)));
    }

    #[test]
    fn read_only_rejects_set() {
        let mut store = ParameterStore::new();
        store
            .register("LOCKED", ParamValue::Float(1.0), ParamFlags::READ_ONLY)
            .unwrap();
        assert_eq!(
            store.set("LOCKED", ParamValue::Float(2.0)).unwrap_err(),
            ParameterError::ReadOnly
        );
    }

    #[test]
    fn over_long_name_is_rejected() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store
                .register(
                    "A_VERY_LONG_PARAMETER_NAME",
                    ParamValue::Bool(true),
                    ParamFlags::empty()
                )
                .unwrap_err(),
            ParameterError::InvalidConfig
        );
    }

    #[test]
    fn iter_all_sees_every_entry() {
        let mut store = ParameterStore::new();
        store
            .register("A", ParamValue::Int(1), ParamFlags::empty())
            .unwrap();
        store
            .register("B", ParamValue::Bool(true), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.iter_all().count(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn value_equality_by_variant() {
        assert_eq!(ParamValue::Float(1.0), ParamValue::Float(1.0));
        assert_ne!(ParamValue::Int(1), ParamValue::Int(2));
        assert_ne!(ParamValue::Int(1), ParamValue::Float(1.0));
    }
}
