//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, DataSource, WriteOutcome};

/// Response body for GET /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub key: String,
    pub data: Value,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    pub age_ms: u64,
}

/// Response body for PUT /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub key: String,
    /// Whether anything was stored
    pub stored: bool,
    /// "direct", "chunked" or "skipped"
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SetResponse {
    /// Describes how a write was persisted.
    pub fn new(key: impl Into<String>, outcome: &WriteOutcome) -> Self {
        let (mode, chunks, reason) = match outcome {
            WriteOutcome::Direct => ("direct", None, None),
            WriteOutcome::Chunked { chunks } => ("chunked", Some(*chunks), None),
            WriteOutcome::Skipped(fault) => ("skipped", None, Some(fault.to_string())),
        };
        Self {
            key: key.into(),
            stored: outcome.is_stored(),
            mode,
            chunks,
            reason,
        }
    }
}

/// Response body for DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for read-through requests (GET /data/*path)
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse {
    pub key: String,
    pub source: DataSource,
    pub data: Value,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counters: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Records stored under the cache namespace, chunks included
    pub records: usize,
    /// Estimated bytes used by the storage medium
    pub usage_bytes: usize,
    /// Size limit enforced by cleanup
    pub max_cache_size: usize,
}

impl StatsResponse {
    pub fn new(counters: CacheStats, records: usize, usage_bytes: usize, max_cache_size: usize) -> Self {
        Self {
            hit_rate: counters.hit_rate(),
            counters,
            records,
            usage_bytes,
            max_cache_size,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageFault;

    #[test]
    fn test_set_response_modes() {
        let direct = serde_json::to_value(SetResponse::new("k", &WriteOutcome::Direct)).unwrap();
        assert_eq!(direct["mode"], "direct");
        assert_eq!(direct["stored"], true);
        assert!(direct.get("chunks").is_none());

        let chunked =
            serde_json::to_value(SetResponse::new("k", &WriteOutcome::Chunked { chunks: 3 })).unwrap();
        assert_eq!(chunked["chunks"], 3);

        let skipped = SetResponse::new(
            "k",
            &WriteOutcome::Skipped(StorageFault::TooLarge { size: 10, limit: 5 }),
        );
        assert!(!skipped.stored);
        assert!(skipped.reason.unwrap().contains("exceeds cache limit"));
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let mut counters = CacheStats::new();
        counters.record_hit();
        counters.record_miss();

        let json = serde_json::to_value(StatsResponse::new(counters, 2, 100, 1000)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 1);
        assert_eq!(json["hit_rate"], 0.5);
        assert_eq!(json["usage_bytes"], 100);
    }

    #[test]
    fn test_data_response_source_lowercase() {
        let resp = DataResponse {
            key: "employees".to_string(),
            source: DataSource::Cache,
            data: Value::Null,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""source":"cache""#));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
