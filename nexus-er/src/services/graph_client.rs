//! Graph engine client
//!
//! The graph service owns nodes, edges and adjacency. This engine only
//! ever tells it results: which node joins a network, and which node pair
//! a merge resolved to. It never writes graph storage directly.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Graph client errors
#[derive(Debug, Error)]
pub enum GraphClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Graph service error {0}: {1}")]
    ApiError(u16, String),
}

/// Write operations the graph engine exposes to this service
#[async_trait]
pub trait GraphNetwork: Send + Sync {
    /// Add a node to an owner's network under a source label
    async fn add_node_to_network(
        &self,
        owner: &str,
        node: &str,
        source: &str,
    ) -> Result<(), GraphClientError>;

    /// Ask the graph engine to re-point the absorbed node's edges onto
    /// the canonical node
    ///
    /// Callers invoke this after a successful merge; the engine does not
    /// chain it automatically.
    async fn apply_merge(&self, absorbed: &str, canonical: &str) -> Result<(), GraphClientError>;
}

/// HTTP client to the graph engine service
pub struct HttpGraphClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpGraphClient {
    pub fn new(base_url: String) -> Result<Self, GraphClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GraphClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<(), GraphClientError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GraphClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GraphClientError::ApiError(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl GraphNetwork for HttpGraphClient {
    async fn add_node_to_network(
        &self,
        owner: &str,
        node: &str,
        source: &str,
    ) -> Result<(), GraphClientError> {
        tracing::debug!(owner = %owner, node = %node, source = %source, "Adding node to network");

        self.post(
            "/network/nodes",
            &serde_json::json!({
                "owner": owner,
                "node": node,
                "source": source,
            }),
        )
        .await
    }

    async fn apply_merge(&self, absorbed: &str, canonical: &str) -> Result<(), GraphClientError> {
        tracing::debug!(absorbed = %absorbed, canonical = %canonical, "Applying merge to graph");

        self.post(
            "/network/merges",
            &serde_json::json!({
                "absorbed": absorbed,
                "canonical": canonical,
            }),
        )
        .await
    }
}
