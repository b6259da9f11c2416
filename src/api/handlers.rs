//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{shared, CachedQuery, CleanupReport, DataSource, SessionCache, SharedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DataQuery, DataResponse, DeleteResponse, EntryResponse, HealthResponse,
    SetResponse, StatsResponse,
};
use crate::storage::MemoryStorage;
use crate::upstream::{Upstream, UpstreamError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache shared with the cleanup task
    pub cache: SharedCache<MemoryStorage>,
    /// Backend used for read-through requests
    pub upstream: Option<Upstream>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: SessionCache<MemoryStorage>) -> Self {
        Self {
            cache: shared(cache),
            upstream: None,
        }
    }

    /// Sets the backend for read-through requests.
    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut storage = MemoryStorage::new(config.storage_quota);
        if let Some(max_item) = config.max_item_size {
            storage = storage.with_max_item(max_item);
        }

        let state = Self::new(SessionCache::new(storage, config.cache.clone()));
        match &config.upstream_url {
            Some(url) => Ok(state.with_upstream(Upstream::new(url.clone())?)),
            None => Ok(state),
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(message) => Err(CacheError::InvalidRequest(message)),
        None => Ok(()),
    }
}

/// Handler for GET /cache/:key
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    check_key(&key)?;

    // Write lock: reads update hit/miss counters
    let (entry, now) = {
        let mut cache = state.cache.write().await;
        let entry = cache.get::<Value>(&key);
        (entry, cache.now_ms())
    };
    let entry = entry.ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse {
        age_ms: entry.age_ms(now),
        key: entry.key,
        data: entry.data,
        timestamp: entry.timestamp,
    }))
}

/// Handler for PUT /cache/:key
///
/// Write failures are reported in the body, not as an error status.
pub async fn set_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<SetResponse>> {
    check_key(&key)?;

    let outcome = state.cache.write().await.set(&key, &data);
    Ok(Json(SetResponse::new(key, &outcome)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;

    if state.cache.write().await.invalidate(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupReport> {
    Json(state.cache.write().await.cleanup())
}

/// Handler for GET /data/*path
///
/// Serves the backend document at `path` through the cache. With
/// `?refresh=true` the cached entry is bypassed and replaced.
pub async fn data_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<DataQuery>,
) -> Result<Json<DataResponse>> {
    check_key(&path)?;
    let upstream = state.upstream.as_ref().ok_or(CacheError::UpstreamUnavailable)?;

    let mut query: CachedQuery<MemoryStorage, Value, UpstreamError> =
        CachedQuery::with_key(state.cache.clone(), path.clone());
    if params.refresh {
        query.refetch(|| upstream.fetch_json(&path)).await;
    } else {
        query.load(&path, || upstream.fetch_json(&path)).await;
    }

    if let Some(error) = query.take_error() {
        return Err(CacheError::Upstream(error.to_string()));
    }

    let source = query.source().unwrap_or(DataSource::Fetch);
    let data = query
        .into_data()
        .ok_or_else(|| CacheError::Internal("read-through produced no data".to_string()))?;

    Ok(Json(DataResponse {
        key: path,
        source,
        data,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;

    Json(StatsResponse::new(
        cache.stats(),
        cache.record_count(),
        cache.usage(),
        cache.config().max_cache_size,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
