//! Storage Module
//!
//! The flat, string-keyed medium the session cache is layered over.
//! The medium has a finite capacity and no notion of expiry.

mod memory;

pub use memory::MemoryStorage;

use crate::error::StorageFault;

/// Default quota of a session-scoped store, in estimated bytes.
pub const DEFAULT_STORAGE_QUOTA: usize = 5 * 1024 * 1024;

// == Storage Trait ==
/// A size-bounded key/value string store.
pub trait Storage: Send + Sync {
    /// Returns the raw value stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Fails with `StorageFault::QuotaExceeded` when the write does not fit.
    /// A failed write leaves the previous value in place.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageFault>;

    /// Removes `key`. Removing an absent key is a no-op.
    fn remove_item(&mut self, key: &str);

    /// Returns every key currently stored.
    fn keys(&self) -> Vec<String>;

    /// Estimated bytes used by all records (keys and values).
    fn used_bytes(&self) -> usize {
        self.keys()
            .iter()
            .map(|key| record_size(key, self.get_item(key).as_deref().unwrap_or("")))
            .sum()
    }
}

// == Size Estimation ==
/// Estimates the stored size of a string as UTF-16 code units times two.
pub fn estimate_size(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

/// Estimated size of a single record, counting both key and value.
pub fn record_size(key: &str, value: &str) -> usize {
    estimate_size(key) + estimate_size(value)
}
