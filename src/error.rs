//! Error types for the session cache
//!
//! `StorageFault` covers everything that can go wrong between the cache and
//! its storage medium. Faults are recovered inside the cache and degrade to a
//! miss; they are never returned as a failure of `get` or `set`.
//! `CacheError` is the HTTP-facing error of the gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Storage Fault Enum ==
/// A recoverable fault raised by the storage medium or while decoding records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageFault {
    /// The medium refused a write because its quota would be exceeded
    #[error("quota exceeded writing {key}: needed {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// The payload is larger than the cache may hold even when chunked
    #[error("payload of {size} bytes exceeds cache limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// A stored record could not be parsed
    #[error("corrupt record {0}")]
    Corrupt(String),

    /// A chunk record belonging to a manifest is absent
    #[error("missing chunk {index} for {key}")]
    MissingChunk { key: String, index: usize },

    /// A chunk record does not belong to the manifest it was read for
    #[error("chunk {index} for {key} does not match its manifest")]
    ChunkMismatch { key: String, index: usize },

    /// The payload could not be turned into JSON
    #[error("serialization failed: {0}")]
    Serialization(String),
}

// == Cache Error Enum ==
/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The upstream backend failed or returned a non-success status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// No upstream backend is configured for read-through requests
    #[error("Upstream not configured")]
    UpstreamUnavailable,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::Upstream("down".into()), StatusCode::BAD_GATEWAY),
            (CacheError::UpstreamUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_fault_display() {
        let fault = StorageFault::MissingChunk {
            key: "emp_list".to_string(),
            index: 2,
        };
        assert_eq!(fault.to_string(), "missing chunk 2 for emp_list");
    }
}
