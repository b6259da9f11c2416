//! Cache Entry Module
//!
//! Defines cache entries, the record shapes written to storage, and the
//! clock used to stamp and expire them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A value read back from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// Logical key, without the namespace prefix
    pub key: String,
    /// The (compressed) payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl<T> CacheEntry<T> {
    // == Is Expired ==
    /// An entry stays valid while `now - timestamp < expiry_ms`.
    pub fn is_expired(&self, now: u64, expiry_ms: u64) -> bool {
        is_expired(self.timestamp, now, expiry_ms)
    }

    /// Age of the entry in milliseconds.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }
}

/// Expiry rule shared by entries, manifests and the cleanup sweep.
pub fn is_expired(timestamp: u64, now: u64, expiry_ms: u64) -> bool {
    now.saturating_sub(timestamp) >= expiry_ms
}

// == Stored Records ==
/// Body of a directly stored entry. A chunked entry stores this same body,
/// serialized and sliced across its chunk records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryBody {
    pub data: Value,
    pub timestamp: u64,
}

/// Manifest written under the entry key once all chunks are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkManifest {
    pub is_chunked: bool,
    pub chunks: usize,
    pub timestamp: u64,
    /// Estimated bytes of the serialized body
    pub size: usize,
}

/// One slice of a chunked body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk: String,
    pub index: usize,
    pub total: usize,
    pub timestamp: u64,
}

/// Any record the cache may find under its namespace.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Manifest(ChunkManifest),
    Chunk(ChunkRecord),
    Entry(EntryBody),
}

impl StoredRecord {
    /// Parses a raw stored value, None if it matches no known shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let record: StoredRecord = serde_json::from_str(raw).ok()?;
        match &record {
            StoredRecord::Manifest(manifest) if !manifest.is_chunked => None,
            _ => Some(record),
        }
    }
}

// == Clock ==
/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        current_timestamp_ms()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry {
            key: "k".to_string(),
            data: (),
            timestamp: 1_000,
        };

        assert!(!entry.is_expired(1_000 + 299_999, 300_000));
        assert!(entry.is_expired(1_000 + 300_000, 300_000));
        assert_eq!(entry.age_ms(1_500), 500);
    }

    #[test]
    fn test_clock_before_timestamp_is_not_expired() {
        assert!(!is_expired(5_000, 4_000, 300_000));
    }

    #[test]
    fn test_parse_entry_body() {
        let raw = r#"{"data":{"c":"x"},"timestamp":42}"#;
        match StoredRecord::parse(raw) {
            Some(StoredRecord::Entry(body)) => {
                assert_eq!(body.data, json!({"c": "x"}));
                assert_eq!(body.timestamp, 42);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_parse_manifest_and_chunk() {
        let manifest = r#"{"isChunked":true,"chunks":3,"timestamp":7,"size":100}"#;
        assert!(matches!(
            StoredRecord::parse(manifest),
            Some(StoredRecord::Manifest(ChunkManifest { chunks: 3, .. }))
        ));

        let chunk = r#"{"chunk":"abc","index":1,"total":3,"timestamp":7}"#;
        assert!(matches!(
            StoredRecord::parse(chunk),
            Some(StoredRecord::Chunk(ChunkRecord { index: 1, .. }))
        ));
    }

    #[test]
    fn test_manifest_serializes_camel_case() {
        let manifest = ChunkManifest {
            is_chunked: true,
            chunks: 2,
            timestamp: 9,
            size: 10,
        };
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"isChunked\":true"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(StoredRecord::parse("{not json").is_none());
        assert!(StoredRecord::parse(r#"{"hello":"world"}"#).is_none());
        assert!(StoredRecord::parse(r#"{"isChunked":false,"chunks":1,"timestamp":1,"size":1}"#).is_none());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        let shared = clock.clone();
        clock.advance(50);
        assert_eq!(shared.now_ms(), 150);
        shared.set(10);
        assert_eq!(clock.now_ms(), 10);
    }
}
