//! Cache Module
//!
//! Session cache over a size-bounded storage medium, with expiry, chunked
//! storage for large payloads and oldest-first eviction.

mod compress;
mod entry;
mod lru;
mod read_through;
mod stats;
mod store;


// Re-export public types
pub use compress::compress;
pub use entry::{
    current_timestamp_ms, CacheEntry, ChunkManifest, ChunkRecord, Clock, ManualClock, SystemClock,
};
pub use lru::{EvictionCandidate, EvictionQueue};
pub use read_through::{shared, CachedQuery, DataSource, SharedCache};
pub use stats::CacheStats;
pub use store::{CleanupReport, SessionCache, WriteOutcome};

// == Public Constants ==
/// Namespace prefix for every storage key the cache owns
pub const CACHE_PREFIX: &str = "churn_cache_";

/// Entry lifetime in milliseconds (5 minutes)
pub const EXPIRY_MS: u64 = 5 * 60 * 1000;

/// Size limit in estimated bytes (4.5 MiB)
pub const MAX_CACHE_SIZE: usize = 4 * 1024 * 1024 + 512 * 1024;

/// Characters per chunk slice
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Maximum allowed logical key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
