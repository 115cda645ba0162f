//! Merge audit-trail API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::Merge;
use crate::AppState;

/// GET /merges/node/:node
///
/// All merges a node participated in, on either side.
pub async fn merges_for_node(
    State(state): State<AppState>,
    Path(node): Path<String>,
) -> ApiResult<Json<Vec<Merge>>> {
    let merges = state.engine.merges_for_node(&node).await?;
    Ok(Json(merges))
}

/// POST /merges/:id/apply
///
/// Ask the graph engine to re-point the absorbed node's edges onto the
/// canonical node. Deliberately a separate call from recording the merge:
/// the caller decides when the graph is updated.
pub async fn apply_merge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let merge = crate::db::merges::get(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("merge {} not found", id)))?;

    state
        .graph
        .apply_merge(&merge.absorbed, &merge.canonical)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    tracing::info!(
        merge = %id,
        absorbed = %merge.absorbed,
        canonical = %merge.canonical,
        "Merge applied to graph"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Build merge routes
pub fn merge_routes() -> Router<AppState> {
    Router::new()
        .route("/merges/node/:node", get(merges_for_node))
        .route("/merges/:id/apply", post(apply_merge))
}
