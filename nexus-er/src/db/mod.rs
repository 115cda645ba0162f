//! Database access for nexus-er
//!
//! SQLite-backed storage for comparisons and merges. The engine owns
//! these tables exclusively; collaborating services only ever see query
//! results, never the tables themselves.

pub mod comparisons;
pub mod merges;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to nexus.db in the root folder, creating it if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    // Run migrations for nexus-er specific tables
    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize nexus-er specific tables
///
/// Creates comparisons and merges tables if they don't exist. The unique
/// index on the canonical (node_a, node_b) pair is what guarantees at
/// most one comparison per unordered pair even under concurrent writers.
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comparisons (
            id TEXT PRIMARY KEY,
            node_a TEXT NOT NULL,
            node_b TEXT NOT NULL,
            similarity_score REAL,
            reasoning TEXT,
            confidence TEXT,
            user_decision TEXT NOT NULL DEFAULT 'pending',
            confirmed_at TEXT,
            created_at TEXT NOT NULL,
            node_a_info TEXT,
            node_b_info TEXT,
            UNIQUE (node_a, node_b)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_comparisons_decision
        ON comparisons (user_decision)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS merges (
            id TEXT PRIMARY KEY,
            absorbed TEXT NOT NULL,
            canonical TEXT NOT NULL,
            comparison TEXT NOT NULL,
            merged_at TEXT NOT NULL,
            merged_by TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (comparisons, merges)");

    Ok(())
}
