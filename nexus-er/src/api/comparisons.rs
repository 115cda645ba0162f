//! Comparison lifecycle API handlers
//!
//! POST /comparisons, POST /comparisons/:id/analyze,
//! POST /comparisons/:id/confirm, DELETE /comparisons/:id,
//! POST /comparisons/:id/merge, plus the read queries.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{Comparison, NodeInfo};
use crate::AppState;

/// POST /comparisons request
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub node_a: String,
    pub node_b: String,
    #[serde(default)]
    pub node_a_info: Option<NodeInfo>,
    #[serde(default)]
    pub node_b_info: Option<NodeInfo>,
}

/// POST /comparisons response
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub comparison: Uuid,
}

/// POST /comparisons/:id/merge request
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub keep_node: String,
}

/// POST /comparisons/:id/merge response
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub merge: Uuid,
}

/// POST /comparisons/:id/confirm request
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub decision: String,
}

/// POST /comparisons
///
/// Create or refresh the comparison for a node pair. Argument order does
/// not matter; the pair is canonicalized before storage.
pub async fn compare_nodes(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> ApiResult<Json<CompareResponse>> {
    let comparison = state
        .engine
        .compare_nodes(
            request.node_a,
            request.node_b,
            request.node_a_info,
            request.node_b_info,
        )
        .await?;

    Ok(Json(CompareResponse { comparison }))
}

/// POST /comparisons/:id/analyze
///
/// Trigger scoring for an unscored comparison. Idempotent: already-scored
/// comparisons return success without another scorer call.
pub async fn analyze_comparison(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.engine.analyze_comparison(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /comparisons/:id/confirm
pub async fn confirm_comparison(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConfirmRequest>,
) -> ApiResult<StatusCode> {
    state.engine.confirm_comparison(id, &request.decision).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /comparisons/:id
pub async fn cancel_comparison(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.engine.cancel_comparison(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /comparisons/:id/merge
pub async fn merge_nodes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MergeRequest>,
) -> ApiResult<Json<MergeResponse>> {
    let merge = state.engine.merge_nodes(id, &request.keep_node).await?;
    Ok(Json(MergeResponse { merge }))
}

/// GET /comparisons/pair/:node_a/:node_b
///
/// Zero-or-one element collection; read queries never error on a miss.
pub async fn comparison_for_pair(
    State(state): State<AppState>,
    Path((node_a, node_b)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Comparison>>> {
    let comparison = state.engine.comparison_for_pair(&node_a, &node_b).await?;
    Ok(Json(comparison.into_iter().collect()))
}

/// GET /comparisons/node/:node
pub async fn comparisons_for_node(
    State(state): State<AppState>,
    Path(node): Path<String>,
) -> ApiResult<Json<Vec<Comparison>>> {
    let comparisons = state.engine.comparisons_for_node(&node).await?;
    Ok(Json(comparisons))
}

/// GET /comparisons/pending
pub async fn pending_comparisons(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Comparison>>> {
    let comparisons = state.engine.pending_comparisons().await?;
    Ok(Json(comparisons))
}

/// GET /comparisons/:id
///
/// Full detail including reasoning and snapshots.
pub async fn comparison_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comparison>>> {
    let comparison = state.engine.comparison_details(id).await?;
    Ok(Json(comparison.into_iter().collect()))
}

/// Build comparison routes
pub fn comparison_routes() -> Router<AppState> {
    Router::new()
        .route("/comparisons", post(compare_nodes))
        .route("/comparisons/pending", get(pending_comparisons))
        .route("/comparisons/pair/:node_a/:node_b", get(comparison_for_pair))
        .route("/comparisons/node/:node", get(comparisons_for_node))
        .route(
            "/comparisons/:id",
            get(comparison_details).delete(cancel_comparison),
        )
        .route("/comparisons/:id/analyze", post(analyze_comparison))
        .route("/comparisons/:id/confirm", post(confirm_comparison))
        .route("/comparisons/:id/merge", post(merge_nodes))
}
