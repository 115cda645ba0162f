//! Error types for nexus-er
//!
//! Engine operations return `EngineError` (the domain taxonomy); API
//! handlers convert into `ApiError` for the HTTP envelope. No engine
//! failure mutates state: every error means "nothing changed".

use crate::services::scorer::ScorerError;
use crate::services::sync::SyncError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Engine error taxonomy
#[derive(Debug, Error)]
pub enum EngineError {
    /// Validation: the same node given twice
    #[error("node_a and node_b must be different")]
    InvalidPair,

    /// Validation: decision outside the allowed enum
    #[error("user decision must be either \"same\" or \"different\", got \"{0}\"")]
    InvalidDecision(String),

    /// Validation: keep node is not part of the comparison
    #[error("keep node {keep} must be either {node_a} or {node_b} from the comparison")]
    InvalidKeepNode {
        keep: String,
        node_a: String,
        node_b: String,
    },

    /// State precondition: comparison does not exist
    #[error("comparison {0} not found")]
    NotFound(Uuid),

    /// State precondition: comparison already carries a decision
    #[error("comparison {comparison} already has a decision ({decision}), cannot confirm again")]
    AlreadyDecided { comparison: Uuid, decision: String },

    /// State precondition: only pending comparisons can be cancelled
    #[error("cannot cancel comparison {comparison}: user decision is \"{decision}\", \"pending\" is required")]
    NotCancellable { comparison: Uuid, decision: String },

    /// State precondition: merge requires a confirmed "same" decision
    #[error("cannot merge nodes: comparison {comparison} has user decision \"{decision}\", but \"same\" is required")]
    WrongDecision { comparison: Uuid, decision: String },

    /// Evidence: snapshots too dissimilar to warrant a comparison
    #[error("no string similarity detected, nodes are too different to warrant comparison")]
    NoSimilarity,

    /// Evidence: snapshots missing for scoring
    #[error("cannot analyze comparison: node information not available")]
    MissingInfo,

    /// External dependency: the scoring call failed; the comparison is
    /// left unscored so the caller can retry the analysis
    #[error("scoring failed: {0}")]
    Scoring(#[from] ScorerError),

    /// Storage failure
    #[error("storage error: {0}")]
    Storage(#[from] nexus_common::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., comparison already decided
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable (422) - request valid but the evidence is not
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Bad gateway (502) - an upstream collaborator failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidPair
            | EngineError::InvalidDecision(_)
            | EngineError::InvalidKeepNode { .. } => ApiError::BadRequest(err.to_string()),

            EngineError::NotFound(_) => ApiError::NotFound(err.to_string()),

            EngineError::AlreadyDecided { .. }
            | EngineError::NotCancellable { .. }
            | EngineError::WrongDecision { .. } => ApiError::Conflict(err.to_string()),

            EngineError::NoSimilarity | EngineError::MissingInfo => {
                ApiError::Unprocessable(err.to_string())
            }

            EngineError::Scoring(_) => ApiError::Upstream(err.to_string()),

            EngineError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::UnknownAccount(_) => ApiError::NotFound(err.to_string()),
            SyncError::Import(_) | SyncError::Graph(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
