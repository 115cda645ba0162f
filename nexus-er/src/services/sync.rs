//! Canonicalization sync
//!
//! Runs when the import pipeline reports a newly added connection.
//! Before the connection becomes a node in the owner's network graph, the
//! sync checks the account's previously imported siblings for an exact
//! profile-identifier duplicate and, when one exists, forwards that prior
//! node instead of creating a second node for the same person.
//!
//! This is a lighter-weight relative of the identity fast-path applied at
//! ingestion time: deterministic, synchronous, and it never creates a
//! comparison or merge record.

use crate::services::graph_client::{GraphClientError, GraphNetwork};
use crate::services::import_client::{ConnectionRecord, ImportClientError, ImportSource};
use crate::services::profile_url::normalize_profile_url;
use chrono::Utc;
use nexus_common::events::{EventBus, NexusEvent};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Default source label for imported connections
pub const DEFAULT_SOURCE: &str = "linkedin";

/// Sync errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Account {0} has no known owner")]
    UnknownAccount(String),

    #[error("Import service error: {0}")]
    Import(#[from] ImportClientError),

    #[error("Graph service error: {0}")]
    Graph(#[from] GraphClientError),
}

/// What the sync forwarded to the graph engine
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// The owning user the node was added for
    pub owner: String,
    /// The node forwarded to the graph engine
    pub node: String,
    /// True when an existing sibling was reused instead of the new
    /// connection
    pub deduplicated: bool,
}

/// Ingestion-time dedup of exact-identifier duplicates
#[derive(Clone)]
pub struct CanonicalizationSync {
    import: Arc<dyn ImportSource>,
    graph: Arc<dyn GraphNetwork>,
    event_bus: EventBus,
}

impl CanonicalizationSync {
    pub fn new(
        import: Arc<dyn ImportSource>,
        graph: Arc<dyn GraphNetwork>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            import,
            graph,
            event_bus,
        }
    }

    /// Handle a connection-added notification from the import pipeline
    ///
    /// Loads the account's sibling records, picks the canonical node for
    /// the new connection, and forwards it to the graph engine's
    /// node-membership operation.
    pub async fn connection_added(
        &self,
        account: &str,
        connection: &str,
        source: &str,
    ) -> Result<SyncOutcome, SyncError> {
        let owner = self
            .import
            .account_owner(account)
            .await?
            .ok_or_else(|| SyncError::UnknownAccount(account.to_string()))?;

        let siblings = self.import.connections(account).await?;
        let canonical = canonical_node(&siblings, connection);
        let deduplicated = canonical != connection;

        if deduplicated {
            tracing::info!(
                account = %account,
                connection = %connection,
                canonical = %canonical,
                "Connection matches an existing profile, reusing prior node"
            );
        }

        self.graph
            .add_node_to_network(&owner, &canonical, source)
            .await?;

        let _ = self.event_bus.emit(NexusEvent::ConnectionSynced {
            account: account.to_string(),
            node: canonical.clone(),
            deduplicated,
            timestamp: Utc::now(),
        });

        Ok(SyncOutcome {
            owner,
            node: canonical,
            deduplicated,
        })
    }
}

/// Pick the canonical node for a newly added connection
///
/// When a sibling carries the same normalized profile URL, that prior
/// connection is the canonical "person" node. When the new connection is
/// missing from the sibling list (import still in flight), fall back to
/// the connection itself.
fn canonical_node(siblings: &[ConnectionRecord], connection: &str) -> String {
    let Some(new_record) = siblings.iter().find(|r| r.id == connection) else {
        return connection.to_string();
    };

    let new_norm = new_record
        .profile_url
        .as_deref()
        .map(normalize_profile_url)
        .unwrap_or_default();
    if new_norm.is_empty() {
        return connection.to_string();
    }

    let duplicate = siblings.iter().find(|r| {
        if r.id == connection {
            return false;
        }
        r.profile_url
            .as_deref()
            .map(normalize_profile_url)
            .map(|norm| !norm.is_empty() && norm == new_norm)
            .unwrap_or(false)
    });

    match duplicate {
        Some(prior) => prior.id.clone(),
        None => connection.to_string(),
    }
}
