//! Cache Statistics Module
//!
//! Tracks cache reads, write outcomes and cleanup activity.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that returned a valid entry
    pub hits: u64,
    /// Reads that found nothing usable (absent, expired or corrupt)
    pub misses: u64,
    /// Payloads stored as a single record
    pub direct_writes: u64,
    /// Payloads stored as chunks plus a manifest
    pub chunked_writes: u64,
    /// Writes that were abandoned without storing anything
    pub failed_writes: u64,
    /// Cleanup sweeps run
    pub cleanups: u64,
    /// Entries removed by size-based eviction
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_direct_write(&mut self) {
        self.direct_writes += 1;
    }

    pub fn record_chunked_write(&mut self) {
        self.chunked_writes += 1;
    }

    pub fn record_failed_write(&mut self) {
        self.failed_writes += 1;
    }

    // == Record Cleanup ==
    /// Counts one sweep and the entries it evicted for size.
    pub fn record_cleanup(&mut self, evicted: usize) {
        self.cleanups += 1;
        self.evictions += evicted as u64;
    }
}
