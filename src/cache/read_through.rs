//! Read-Through Module
//!
//! `CachedQuery` serves a key from the cache when it can and otherwise runs a
//! caller-supplied async fetch and stores its result.
//!
//! Fetches are not coalesced: two queries loading the same key concurrently
//! both fetch, and whichever `set` lands last wins, even if it carries the
//! older result. An in-flight fetch cannot be cancelled.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::SessionCache;
use crate::storage::Storage;

/// A cache shared between queries and the cleanup task.
pub type SharedCache<S> = Arc<RwLock<SessionCache<S>>>;

/// Wraps a cache for sharing.
pub fn shared<S: Storage>(cache: SessionCache<S>) -> SharedCache<S> {
    Arc::new(RwLock::new(cache))
}

// == Data Source ==
/// Where the currently served data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Fetch,
}

// == Cached Query ==
/// Read-through state for one consumer: the key it is bound to, the data
/// it serves, and the error of its last fetch.
#[derive(Debug)]
pub struct CachedQuery<S: Storage, T, E> {
    cache: SharedCache<S>,
    key: Option<String>,
    data: Option<T>,
    source: Option<DataSource>,
    is_loading: bool,
    error: Option<E>,
}

impl<S, T, E> CachedQuery<S, T, E>
where
    S: Storage,
    T: Serialize + DeserializeOwned,
    E: Display,
{
    /// Creates an unbound query.
    pub fn new(cache: SharedCache<S>) -> Self {
        Self {
            cache,
            key: None,
            data: None,
            source: None,
            is_loading: false,
            error: None,
        }
    }

    /// Creates a query bound to `key` without loading it.
    pub fn with_key(cache: SharedCache<S>, key: impl Into<String>) -> Self {
        let mut query = Self::new(cache);
        query.key = Some(key.into());
        query
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<E> {
        self.error.take()
    }

    // == Load ==
    /// Binds the query to `key` and serves it.
    ///
    /// A cache hit is served without calling `fetch`. On a miss (absent,
    /// expired or unreadable entry) `fetch` is awaited and its result stored.
    pub async fn load<F, Fut>(&mut self, key: &str, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.key = Some(key.to_string());

        let cached = self.cache.write().await.get::<T>(key);
        if let Some(entry) = cached {
            debug!(key, "serving from cache");
            self.data = Some(entry.data);
            self.source = Some(DataSource::Cache);
            self.error = None;
            return;
        }

        self.fetch_and_store(key, fetch).await;
    }

    // == Refetch ==
    /// Fetches the bound key even if a valid entry is cached.
    ///
    /// Does nothing if the query is not bound to a key.
    pub async fn refetch<F, Fut>(&mut self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(key) = self.key.clone() else {
            return;
        };
        self.fetch_and_store(&key, fetch).await;
    }

    /// Runs `fetch`, storing and serving its result. A failed fetch keeps
    /// whatever data was served before.
    async fn fetch_and_store<F, Fut>(&mut self, key: &str, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.is_loading = true;
        self.error = None;

        match fetch().await {
            Ok(data) => {
                let outcome = self.cache.write().await.set(key, &data);
                debug!(key, ?outcome, "stored fetched data");
                self.data = Some(data);
                self.source = Some(DataSource::Fetch);
            }
            Err(e) => {
                warn!(key, error = %e, "fetch failed");
                self.error = Some(e);
            }
        }

        self.is_loading = false;
    }
}
