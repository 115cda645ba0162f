//! nexus-er - Entity Resolution Microservice
//!
//! Decides whether two nodes in a user's multi-source network represent
//! the same real-world person: tracks comparisons, scores them through an
//! external reasoning service, records confirmed merges, and dedups
//! imported connections at ingestion time.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nexus_common::events::EventBus;
use nexus_er::services::graph_client::HttpGraphClient;
use nexus_er::services::import_client::HttpImportClient;
use nexus_er::services::scorer::GeminiScorer;
use nexus_er::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting nexus-er (Entity Resolution) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration (CLI arg > ENV > TOML > defaults)
    let cli_root = std::env::args().nth(1);
    let config = nexus_er::config::resolve(cli_root.as_deref())?;

    nexus_common::config::ensure_root_folder(&config.root_folder)?;

    let db_path = nexus_common::config::database_path(&config.root_folder);
    info!("Database: {}", db_path.display());

    // Initialize database connection pool
    let db_pool = nexus_er::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Create event bus for SSE broadcasting
    let event_bus = EventBus::new(100); // 100 event capacity
    info!("Event bus initialized");

    // External collaborators
    let scorer = Arc::new(GeminiScorer::new(config.scorer.clone())?);
    let graph = Arc::new(HttpGraphClient::new(config.graph_base_url.clone())?);
    let import = Arc::new(HttpImportClient::new(config.import_base_url.clone())?);

    // Create application state
    let state = AppState::new(db_pool, event_bus, scorer, import, graph);

    // Build router
    let app = nexus_er::build_router(state);

    // Start server
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
