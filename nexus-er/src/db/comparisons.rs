//! Comparison table operations
//!
//! All writes assume the caller already canonicalized the node pair via
//! `models::canonical_key` / `models::canonicalize_pair`. The upserts use
//! `ON CONFLICT (node_a, node_b)` so two concurrent compare calls for the
//! same pair converge on one row instead of racing a find-then-insert.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{Comparison, Confidence, NodeInfo, UserDecision};
use nexus_common::{Error, Result};

/// Create or refresh the comparison for a canonical pair without scoring
///
/// On conflict the existing row keeps its id, created_at and any scoring
/// fields; the snapshots are replaced and the decision returns to pending
/// (a fresh compare re-opens a decided question). Returns the id of the
/// surviving row.
pub async fn upsert_unscored(
    pool: &SqlitePool,
    candidate_id: Uuid,
    node_a: &str,
    node_b: &str,
    node_a_info: Option<&NodeInfo>,
    node_b_info: Option<&NodeInfo>,
    created_at: DateTime<Utc>,
) -> Result<Uuid> {
    let info_a = encode_info(node_a_info)?;
    let info_b = encode_info(node_b_info)?;

    sqlx::query(
        r#"
        INSERT INTO comparisons (
            id, node_a, node_b, user_decision, created_at, node_a_info, node_b_info
        ) VALUES (?, ?, ?, 'pending', ?, ?, ?)
        ON CONFLICT(node_a, node_b) DO UPDATE SET
            node_a_info = excluded.node_a_info,
            node_b_info = excluded.node_b_info,
            user_decision = 'pending'
        "#,
    )
    .bind(candidate_id.to_string())
    .bind(node_a)
    .bind(node_b)
    .bind(created_at.to_rfc3339())
    .bind(&info_a)
    .bind(&info_b)
    .execute(pool)
    .await?;

    surviving_id(pool, node_a, node_b).await
}

/// Create or replace the comparison for a pair matched by an exact
/// identity identifier
///
/// Unlike `upsert_unscored` this overwrites scoring fields wholesale: an
/// exact identifier match supersedes any earlier assessment, and the
/// decision returns to pending for downstream confirmation. Returns the
/// id of the surviving row.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_identity_match(
    pool: &SqlitePool,
    candidate_id: Uuid,
    node_a: &str,
    node_b: &str,
    similarity_score: f64,
    reasoning: &str,
    confidence: Confidence,
    node_a_info: &NodeInfo,
    node_b_info: &NodeInfo,
    created_at: DateTime<Utc>,
) -> Result<Uuid> {
    let info_a = encode_info(Some(node_a_info))?;
    let info_b = encode_info(Some(node_b_info))?;

    sqlx::query(
        r#"
        INSERT INTO comparisons (
            id, node_a, node_b, similarity_score, reasoning, confidence,
            user_decision, created_at, node_a_info, node_b_info
        ) VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?)
        ON CONFLICT(node_a, node_b) DO UPDATE SET
            similarity_score = excluded.similarity_score,
            reasoning = excluded.reasoning,
            confidence = excluded.confidence,
            user_decision = 'pending',
            node_a_info = excluded.node_a_info,
            node_b_info = excluded.node_b_info
        "#,
    )
    .bind(candidate_id.to_string())
    .bind(node_a)
    .bind(node_b)
    .bind(similarity_score)
    .bind(reasoning)
    .bind(confidence.as_str())
    .bind(created_at.to_rfc3339())
    .bind(&info_a)
    .bind(&info_b)
    .execute(pool)
    .await?;

    surviving_id(pool, node_a, node_b).await
}

/// Look up the comparison for a canonical pair
pub async fn find_by_pair(
    pool: &SqlitePool,
    node_a: &str,
    node_b: &str,
) -> Result<Option<Comparison>> {
    let row = sqlx::query(
        r#"
        SELECT id, node_a, node_b, similarity_score, reasoning, confidence,
               user_decision, confirmed_at, created_at, node_a_info, node_b_info
        FROM comparisons
        WHERE node_a = ? AND node_b = ?
        "#,
    )
    .bind(node_a)
    .bind(node_b)
    .fetch_optional(pool)
    .await?;

    row.map(|r| comparison_from_row(&r)).transpose()
}

/// Load a comparison by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Comparison>> {
    let row = sqlx::query(
        r#"
        SELECT id, node_a, node_b, similarity_score, reasoning, confidence,
               user_decision, confirmed_at, created_at, node_a_info, node_b_info
        FROM comparisons
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|r| comparison_from_row(&r)).transpose()
}

/// All comparisons involving a node, on either side of the pair
pub async fn for_node(pool: &SqlitePool, node: &str) -> Result<Vec<Comparison>> {
    let rows = sqlx::query(
        r#"
        SELECT id, node_a, node_b, similarity_score, reasoning, confidence,
               user_decision, confirmed_at, created_at, node_a_info, node_b_info
        FROM comparisons
        WHERE node_a = ? OR node_b = ?
        ORDER BY created_at
        "#,
    )
    .bind(node)
    .bind(node)
    .fetch_all(pool)
    .await?;

    rows.iter().map(comparison_from_row).collect()
}

/// All comparisons still awaiting a decision
pub async fn pending(pool: &SqlitePool) -> Result<Vec<Comparison>> {
    let rows = sqlx::query(
        r#"
        SELECT id, node_a, node_b, similarity_score, reasoning, confidence,
               user_decision, confirmed_at, created_at, node_a_info, node_b_info
        FROM comparisons
        WHERE user_decision = 'pending'
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(comparison_from_row).collect()
}

/// Record scoring results for a comparison
///
/// Deliberately does not touch user_decision: scoring and deciding are
/// independent sub-states.
pub async fn record_scores(
    pool: &SqlitePool,
    id: Uuid,
    similarity_score: f64,
    reasoning: &str,
    confidence: Confidence,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE comparisons
        SET similarity_score = ?, reasoning = ?, confidence = ?
        WHERE id = ?
        "#,
    )
    .bind(similarity_score)
    .bind(reasoning)
    .bind(confidence.as_str())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a user decision, only if the comparison is still pending
///
/// The pending check happens in the WHERE clause so two concurrent
/// confirmations cannot both succeed. Returns false when no pending row
/// matched (already decided, or deleted).
pub async fn confirm_pending(
    pool: &SqlitePool,
    id: Uuid,
    decision: UserDecision,
    confirmed_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE comparisons
        SET user_decision = ?, confirmed_at = ?
        WHERE id = ? AND user_decision = 'pending'
        "#,
    )
    .bind(decision.as_str())
    .bind(confirmed_at.to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a comparison, only while it is still pending
///
/// Returns false when no pending row matched.
pub async fn delete_pending(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM comparisons
        WHERE id = ? AND user_decision = 'pending'
        "#,
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Id of the row holding a canonical pair after an upsert
async fn surviving_id(pool: &SqlitePool, node_a: &str, node_b: &str) -> Result<Uuid> {
    let id: String = sqlx::query_scalar(
        r#"
        SELECT id FROM comparisons WHERE node_a = ? AND node_b = ?
        "#,
    )
    .bind(node_a)
    .bind(node_b)
    .fetch_one(pool)
    .await?;

    Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("Failed to parse comparison id: {}", e)))
}

fn comparison_from_row(row: &SqliteRow) -> Result<Comparison> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse comparison id: {}", e)))?;

    let user_decision: String = row.get("user_decision");
    let user_decision = UserDecision::from_str(&user_decision)
        .map_err(|_| Error::Internal(format!("Unknown user_decision value: {}", user_decision)))?;

    let confidence: Option<String> = row.get("confidence");
    let confidence = confidence
        .map(|c| {
            Confidence::from_str(&c)
                .map_err(|_| Error::Internal(format!("Unknown confidence value: {}", c)))
        })
        .transpose()?;

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    let confirmed_at: Option<String> = row.get("confirmed_at");
    let confirmed_at = confirmed_at
        .map(|s| DateTime::parse_from_rfc3339(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to parse confirmed_at: {}", e)))?
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Comparison {
        id,
        node_a: row.get("node_a"),
        node_b: row.get("node_b"),
        similarity_score: row.get("similarity_score"),
        reasoning: row.get("reasoning"),
        confidence,
        user_decision,
        confirmed_at,
        created_at,
        node_a_info: decode_info(row.get("node_a_info"))?,
        node_b_info: decode_info(row.get("node_b_info"))?,
    })
}

fn encode_info(info: Option<&NodeInfo>) -> Result<Option<String>> {
    info.map(|i| {
        serde_json::to_string(i)
            .map_err(|e| Error::Internal(format!("Failed to serialize node info: {}", e)))
    })
    .transpose()
}

fn decode_info(raw: Option<String>) -> Result<Option<NodeInfo>> {
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| Error::Internal(format!("Failed to deserialize node info: {}", e)))
    })
    .transpose()
}
