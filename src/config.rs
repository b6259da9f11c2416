//! Configuration Module
//!
//! Handles loading and managing gateway and cache configuration from
//! environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::{CACHE_PREFIX, CHUNK_SIZE, EXPIRY_MS, MAX_CACHE_SIZE};
use crate::storage::DEFAULT_STORAGE_QUOTA;

// == Cache Config ==
/// Parameters of a single `SessionCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Namespace prefix prepended to every storage key
    pub prefix: String,
    /// Entries are valid while younger than this many milliseconds
    pub expiry_ms: u64,
    /// Upper bound on estimated bytes, both per payload and for cleanup
    pub max_cache_size: usize,
    /// Characters per chunk slice
    pub chunk_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: CACHE_PREFIX.to_string(),
            expiry_ms: EXPIRY_MS,
            max_cache_size: MAX_CACHE_SIZE,
            chunk_size: CHUNK_SIZE,
        }
    }
}

// == Config ==
/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup sweep interval in seconds
    pub cleanup_interval: u64,
    /// Base URL of the backend used for read-through requests
    pub upstream_url: Option<String>,
    /// Total quota of the storage medium in estimated bytes
    pub storage_quota: usize,
    /// Largest single record the storage medium accepts
    pub max_item_size: Option<usize>,
    /// Cache parameters
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup sweep frequency in seconds (default: 60)
    /// - `UPSTREAM_URL` - Backend base URL (default: unset)
    /// - `STORAGE_QUOTA` - Storage quota in bytes (default: 5 MiB)
    /// - `MAX_ITEM_SIZE` - Per-record ceiling in bytes (default: unset)
    /// - `CACHE_PREFIX` - Storage key namespace (default: `churn_cache_`)
    /// - `CACHE_EXPIRY_MS` - Entry lifetime (default: 300000)
    /// - `MAX_CACHE_SIZE` - Cache size limit in bytes (default: 4.5 MiB)
    /// - `CHUNK_SIZE` - Characters per chunk (default: 1 Mi)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            storage_quota: parse_var("STORAGE_QUOTA").unwrap_or(defaults.storage_quota),
            max_item_size: parse_var("MAX_ITEM_SIZE"),
            cache: CacheConfig {
                prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.cache.prefix),
                expiry_ms: parse_var("CACHE_EXPIRY_MS").unwrap_or(defaults.cache.expiry_ms),
                max_cache_size: parse_var("MAX_CACHE_SIZE")
                    .unwrap_or(defaults.cache.max_cache_size),
                chunk_size: parse_var::<usize>("CHUNK_SIZE")
                    .filter(|size| *size > 0)
                    .unwrap_or(defaults.cache.chunk_size),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 60,
            upstream_url: None,
            storage_quota: DEFAULT_STORAGE_QUOTA,
            max_item_size: None,
            cache: CacheConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert!(config.upstream_url.is_none());
        assert_eq!(config.storage_quota, 5 * 1024 * 1024);
        assert_eq!(config.cache.expiry_ms, 5 * 60 * 1000);
        assert_eq!(config.cache.max_cache_size, 4_718_592);
        assert_eq!(config.cache.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "CLEANUP_INTERVAL",
            "UPSTREAM_URL",
            "STORAGE_QUOTA",
            "MAX_ITEM_SIZE",
            "CACHE_PREFIX",
            "CACHE_EXPIRY_MS",
            "MAX_CACHE_SIZE",
            "CHUNK_SIZE",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert!(config.max_item_size.is_none());
        assert_eq!(config.cache, CacheConfig::default());
    }
}
