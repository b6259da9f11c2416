//! Session Cache - A read-through cache over a size-bounded session store
//!
//! Provides expiry, chunked storage for large payloads and oldest-first
//! eviction, plus a small HTTP gateway that fronts a JSON backend with it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use cache::{CacheEntry, CachedQuery, SessionCache, WriteOutcome};
pub use config::{CacheConfig, Config};
pub use storage::{MemoryStorage, Storage};
pub use tasks::spawn_cleanup_task;
