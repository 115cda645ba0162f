//! Connection-import service client
//!
//! The import pipeline owns raw connection records per source account.
//! The canonicalization sync reads them back to detect exact-identifier
//! duplicates at ingestion time.

use crate::models::NodeInfo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Import client errors
#[derive(Debug, Error)]
pub enum ImportClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Import service error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One imported connection record
///
/// `profile_url` is the optional external identifier used for exact
/// dedup; everything else the source provided rides along as an open
/// attribute bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Connection identifier, doubles as the graph node identifier
    pub id: String,
    /// External profile URL, when the source provided one
    #[serde(rename = "profileUrl")]
    pub profile_url: Option<String>,
    /// Remaining source attributes (names, company, location, ...)
    #[serde(flatten)]
    pub attributes: NodeInfo,
}

/// Read operations the import pipeline exposes to this service
#[async_trait]
pub trait ImportSource: Send + Sync {
    /// The user who owns an import account
    async fn account_owner(&self, account: &str) -> Result<Option<String>, ImportClientError>;

    /// All connections previously imported for an account
    async fn connections(&self, account: &str) -> Result<Vec<ConnectionRecord>, ImportClientError>;
}

/// HTTP client to the connection-import service
pub struct HttpImportClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpImportClient {
    pub fn new(base_url: String) -> Result<Self, ImportClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ImportClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<T, ImportClientError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ImportClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ImportClientError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ImportClientError::ParseError(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AccountOwnerResponse {
    owner: Option<String>,
}

#[async_trait]
impl ImportSource for HttpImportClient {
    async fn account_owner(&self, account: &str) -> Result<Option<String>, ImportClientError> {
        let response: AccountOwnerResponse = self
            .get_json(&format!("/accounts/{}/owner", account))
            .await?;
        Ok(response.owner)
    }

    async fn connections(&self, account: &str) -> Result<Vec<ConnectionRecord>, ImportClientError> {
        self.get_json(&format!("/accounts/{}/connections", account))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_record_flattens_attributes() {
        let json = r#"{
            "id": "conn-1",
            "profileUrl": "linkedin.com/in/jdoe",
            "firstName": "Jon",
            "location": "Boston"
        }"#;

        let record: ConnectionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "conn-1");
        assert_eq!(record.profile_url.as_deref(), Some("linkedin.com/in/jdoe"));
        assert_eq!(
            record.attributes.get("firstName"),
            Some(&crate::models::AttrValue::Text("Jon".to_string()))
        );
    }

    #[test]
    fn test_connection_record_tolerates_missing_profile_url() {
        let record: ConnectionRecord = serde_json::from_str(r#"{"id": "conn-2"}"#).unwrap();
        assert!(record.profile_url.is_none());
        assert!(record.attributes.is_empty());
    }
}
