//! Request DTOs for the gateway API
//!
//! Defines path and query parameters accepted by the endpoints.

use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;

/// Validates a logical cache key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    if key.contains("_chunk_") {
        return Some("Key cannot contain the reserved segment '_chunk_'".to_string());
    }
    None
}

/// Query parameters for read-through requests (GET /data/*path)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataQuery {
    /// Fetch from upstream even if a valid entry is cached
    #[serde(default)]
    pub refresh: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_key() {
        assert!(validate_key("").is_some());
    }

    #[test]
    fn test_validate_long_key() {
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_some());
    }

    #[test]
    fn test_validate_reserved_segment() {
        assert!(validate_key("emp_chunk_0").is_some());
    }

    #[test]
    fn test_validate_valid_key() {
        assert!(validate_key("emp_list").is_none());
    }

    #[test]
    fn test_data_query_deserialize() {
        let query: DataQuery = serde_json::from_str(r#"{"refresh": true}"#).unwrap();
        assert!(query.refresh);

        let query: DataQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.refresh);
    }
}
