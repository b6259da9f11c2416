//! Upstream Client
//!
//! Fetches JSON documents from the backend the gateway fronts. Used as the
//! fetch function of read-through requests.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Requests to the backend give up after this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// == Upstream Error ==
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned an invalid JSON body: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// == Upstream ==
/// HTTP client bound to a backend base URL.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: String,
}

impl Upstream {
    /// Creates a client for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a backend path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // == Fetch JSON ==
    /// GETs `path` from the backend and decodes the body as JSON.
    pub async fn fetch_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = self.url_for(path);
        debug!(%url, "fetching from upstream");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| UpstreamError::Body { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_slashes() {
        let upstream = Upstream::new("http://backend:8000/api/").unwrap();
        assert_eq!(upstream.base_url(), "http://backend:8000/api");
        assert_eq!(
            upstream.url_for("/employees/risk"),
            "http://backend:8000/api/employees/risk"
        );
        assert_eq!(upstream.url_for("stats"), "http://backend:8000/api/stats");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_request_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let upstream = Upstream::new("http://127.0.0.1:9").unwrap();
        let result = upstream.fetch_json("anything").await;
        assert!(matches!(result, Err(UpstreamError::Request { .. })));
    }
}
