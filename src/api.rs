//! Fallback REST fetches for partial push payloads.
//!
//! Edge events in particular arrive without denormalized endpoint ids; the
//! reconciler fetches the full object through [`GraphApi`] to decide which
//! relationship caches to invalidate. The trait is the seam — tests and
//! embedders supply their own — and [`HttpGraphApi`] is the bundled
//! reqwest-backed implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{LatticeLinkError, Result};

/// A full edge object as returned by the REST API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FullEdge {
    /// Edge UUID.
    pub id: String,
    /// Source node UUID.
    pub source_id: Option<String>,
    /// Target node UUID.
    pub target_id: Option<String>,
    /// Relation name.
    pub name: Option<String>,
    /// Natural-language fact.
    pub fact: Option<String>,
}

/// Capability for fetching full objects when a push payload is partial.
///
/// Only edges need this today: edge events are the one place the wire
/// payload cannot name the cache keys a rule has to touch.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetch the full edge for `id`.
    async fn fetch_edge(&self, id: &str) -> Result<FullEdge>;
}

/// reqwest-backed [`GraphApi`] against the Lattice REST surface.
#[derive(Debug, Clone)]
pub struct HttpGraphApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGraphApi {
    /// Create a client for the given HTTP(S) origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LatticeLinkError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| LatticeLinkError::ProtocolError(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl GraphApi for HttpGraphApi {
    async fn fetch_edge(&self, id: &str) -> Result<FullEdge> {
        self.get_json(&format!("/v1/edges/{}", id)).await
    }
}
