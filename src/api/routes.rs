//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, data_handler, delete_entry_handler, get_entry_handler, health_handler,
    set_entry_handler, stats_handler, AppState,
};

/// Request bodies above this size are rejected before reaching the cache.
/// Larger than the cache limit so oversized writes are reported by the cache.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/:key` - Read a cached entry
/// - `PUT /cache/:key` - Store a JSON document
/// - `DELETE /cache/:key` - Invalidate an entry
/// - `POST /cleanup` - Run a cleanup sweep
/// - `GET /data/*path` - Read-through fetch from the upstream backend
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:key",
            get(get_entry_handler)
                .put(set_entry_handler)
                .delete(delete_entry_handler),
        )
        .route("/cleanup", post(cleanup_handler))
        .route("/data/*path", get(data_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
