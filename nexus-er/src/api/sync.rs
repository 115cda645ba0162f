//! Canonicalization sync API handler
//!
//! The import pipeline calls this after persisting a new connection.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::sync::DEFAULT_SOURCE;
use crate::AppState;

/// POST /sync/connection-added request
#[derive(Debug, Deserialize)]
pub struct ConnectionAddedRequest {
    pub account: String,
    pub connection: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// POST /sync/connection-added response
#[derive(Debug, Serialize)]
pub struct ConnectionAddedResponse {
    pub owner: String,
    pub node: String,
    pub deduplicated: bool,
}

/// POST /sync/connection-added
pub async fn connection_added(
    State(state): State<AppState>,
    Json(request): Json<ConnectionAddedRequest>,
) -> ApiResult<Json<ConnectionAddedResponse>> {
    let source = request.source.as_deref().unwrap_or(DEFAULT_SOURCE);

    let outcome = state
        .sync
        .connection_added(&request.account, &request.connection, source)
        .await?;

    Ok(Json(ConnectionAddedResponse {
        owner: outcome.owner,
        node: outcome.node,
        deduplicated: outcome.deduplicated,
    }))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new().route("/sync/connection-added", post(connection_added))
}
