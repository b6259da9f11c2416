//! API Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /cache/:key` - Direct cache access
//! - `POST /cleanup` - Run a cleanup sweep
//! - `GET /data/*path` - Read-through fetch from the upstream backend
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
