//! Merge table operations
//!
//! Merges are append-only: there is deliberately no update or delete here.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{Merge, MergedBy};
use nexus_common::{Error, Result};

/// Append a merge record
pub async fn insert(pool: &SqlitePool, merge: &Merge) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO merges (id, absorbed, canonical, comparison, merged_at, merged_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(merge.id.to_string())
    .bind(&merge.absorbed)
    .bind(&merge.canonical)
    .bind(merge.comparison.to_string())
    .bind(merge.merged_at.to_rfc3339())
    .bind(merge.merged_by.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a merge by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Merge>> {
    let row = sqlx::query(
        r#"
        SELECT id, absorbed, canonical, comparison, merged_at, merged_by
        FROM merges
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|r| merge_from_row(&r)).transpose()
}

/// All merges involving a node, as either the absorbed or canonical side
pub async fn for_node(pool: &SqlitePool, node: &str) -> Result<Vec<Merge>> {
    let rows = sqlx::query(
        r#"
        SELECT id, absorbed, canonical, comparison, merged_at, merged_by
        FROM merges
        WHERE absorbed = ? OR canonical = ?
        ORDER BY merged_at
        "#,
    )
    .bind(node)
    .bind(node)
    .fetch_all(pool)
    .await?;

    rows.iter().map(merge_from_row).collect()
}

fn merge_from_row(row: &SqliteRow) -> Result<Merge> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse merge id: {}", e)))?;

    let comparison: String = row.get("comparison");
    let comparison = Uuid::parse_str(&comparison)
        .map_err(|e| Error::Internal(format!("Failed to parse comparison id: {}", e)))?;

    let merged_at: String = row.get("merged_at");
    let merged_at = DateTime::parse_from_rfc3339(&merged_at)
        .map_err(|e| Error::Internal(format!("Failed to parse merged_at: {}", e)))?
        .with_timezone(&Utc);

    let merged_by: String = row.get("merged_by");
    let merged_by = MergedBy::from_str(&merged_by)
        .map_err(|_| Error::Internal(format!("Unknown merged_by value: {}", merged_by)))?;

    Ok(Merge {
        id,
        absorbed: row.get("absorbed"),
        canonical: row.get("canonical"),
        comparison,
        merged_at,
        merged_by,
    })
}
