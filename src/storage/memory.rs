//! In-memory storage medium with a quota.

use std::collections::HashMap;

use super::{record_size, Storage, DEFAULT_STORAGE_QUOTA};
use crate::error::StorageFault;

// == Memory Storage ==
/// A `HashMap`-backed store that enforces a total quota and an optional
/// per-item ceiling, both measured with [`record_size`].
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    /// Total estimated bytes allowed across all records
    quota: usize,
    /// Largest single record accepted, None = only the quota applies
    max_item: Option<usize>,
    /// Running total of estimated bytes
    used: usize,
}

impl MemoryStorage {
    // == Constructor ==
    /// Creates an empty store with the given total quota.
    pub fn new(quota: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota,
            max_item: None,
            used: 0,
        }
    }

    /// Sets a ceiling on the size of any single record.
    pub fn with_max_item(mut self, max_item: usize) -> Self {
        self.max_item = Some(max_item);
        self
    }

}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_QUOTA)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageFault> {
        let needed = record_size(key, value);
        let replaced = self
            .items
            .get(key)
            .map(|old| record_size(key, old))
            .unwrap_or(0);
        let available = self.quota.saturating_sub(self.used - replaced);

        let over_item = self.max_item.is_some_and(|max| needed > max);
        if over_item || needed > available {
            return Err(StorageFault::QuotaExceeded {
                key: key.to_string(),
                needed,
                available: self.max_item.map_or(available, |max| max.min(available)),
            });
        }

        self.items.insert(key.to_string(), value.to_string());
        self.used = self.used - replaced + needed;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(old) = self.items.remove(key) {
            self.used -= record_size(key, &old);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    fn used_bytes(&self) -> usize {
        self.used
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut storage = MemoryStorage::new(1024);
        storage.set_item("a", "hello").unwrap();

        assert_eq!(storage.get_item("a").as_deref(), Some("hello"));
        assert_eq!(storage.used_bytes(), 12);
        assert_eq!(storage.keys().len(), 1);
    }

    #[test]
    fn test_quota_exceeded() {
        let mut storage = MemoryStorage::new(20);
        storage.set_item("a", "12345").unwrap();

        let result = storage.set_item("b", "12345");
        assert!(matches!(result, Err(StorageFault::QuotaExceeded { .. })));
        assert!(storage.get_item("b").is_none());
        assert_eq!(storage.used_bytes(), 12);
    }

    #[test]
    fn test_overwrite_reuses_space() {
        let mut storage = MemoryStorage::new(14);
        storage.set_item("a", "123456").unwrap();

        // Replacing the value frees the old bytes first
        storage.set_item("a", "654321").unwrap();
        assert_eq!(storage.get_item("a").as_deref(), Some("654321"));
        assert_eq!(storage.used_bytes(), 14);
    }

    #[test]
    fn test_failed_overwrite_keeps_old_value() {
        let mut storage = MemoryStorage::new(14);
        storage.set_item("a", "123456").unwrap();

        assert!(storage.set_item("a", "1234567").is_err());
        assert_eq!(storage.get_item("a").as_deref(), Some("123456"));
    }

    #[test]
    fn test_max_item() {
        let mut storage = MemoryStorage::new(1024).with_max_item(10);

        assert!(storage.set_item("a", "1234").is_ok());
        assert!(matches!(
            storage.set_item("b", "123456789"),
            Err(StorageFault::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn test_remove() {
        let mut storage = MemoryStorage::new(1024);
        storage.set_item("a", "x").unwrap();
        storage.remove_item("a");
        storage.remove_item("missing");

        assert!(storage.keys().is_empty());
        assert_eq!(storage.used_bytes(), 0);
    }
}
