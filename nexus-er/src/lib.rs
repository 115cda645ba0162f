//! nexus-er library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::engine::DisambiguationEngine;
use crate::services::graph_client::GraphNetwork;
use crate::services::import_client::ImportSource;
use crate::services::scorer::SimilarityScorer;
use crate::services::sync::CanonicalizationSync;
use nexus_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// The disambiguation engine
    pub engine: DisambiguationEngine,
    /// Ingestion-time canonicalization sync
    pub sync: CanonicalizationSync,
    /// Graph engine client, for caller-requested merge application
    pub graph: Arc<dyn GraphNetwork>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        scorer: Arc<dyn SimilarityScorer>,
        import: Arc<dyn ImportSource>,
        graph: Arc<dyn GraphNetwork>,
    ) -> Self {
        let engine = DisambiguationEngine::new(db.clone(), scorer, event_bus.clone());
        let sync = CanonicalizationSync::new(import, graph.clone(), event_bus.clone());

        Self {
            db,
            event_bus,
            engine,
            sync,
            graph,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::comparison_routes())
        .merge(api::merge_routes())
        .merge(api::sync_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
}
