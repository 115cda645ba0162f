//! Integration tests for the HTTP API
//!
//! Exercises the axum router end to end with in-process requests,
//! checking the success envelopes and the error-status mapping.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

use nexus_common::events::EventBus;
use nexus_er::models::{Confidence, NodeInfo};
use nexus_er::services::graph_client::{GraphClientError, GraphNetwork};
use nexus_er::services::import_client::{ConnectionRecord, ImportClientError, ImportSource};
use nexus_er::services::scorer::{ScoreOutcome, ScorerError, SimilarityScorer};
use nexus_er::{build_router, AppState};

struct StubScorer {
    fail: bool,
}

#[async_trait]
impl SimilarityScorer for StubScorer {
    async fn score(
        &self,
        _info_a: &NodeInfo,
        _info_b: &NodeInfo,
    ) -> Result<ScoreOutcome, ScorerError> {
        if self.fail {
            return Err(ScorerError::NetworkError("connection refused".to_string()));
        }
        Ok(ScoreOutcome {
            similarity_score: 0.85,
            confidence: Confidence::High,
            reasoning: "Names and companies line up.".to_string(),
        })
    }
}

struct StubImport;

#[async_trait]
impl ImportSource for StubImport {
    async fn account_owner(&self, account: &str) -> Result<Option<String>, ImportClientError> {
        if account == "acct-1" {
            Ok(Some("user-1".to_string()))
        } else {
            Ok(None)
        }
    }

    async fn connections(&self, _account: &str) -> Result<Vec<ConnectionRecord>, ImportClientError> {
        Ok(vec![
            ConnectionRecord {
                id: "conn-1".to_string(),
                profile_url: Some("https://www.linkedin.com/in/jdoe".to_string()),
                attributes: NodeInfo::new(),
            },
            ConnectionRecord {
                id: "conn-2".to_string(),
                profile_url: Some("linkedin.com/in/jdoe".to_string()),
                attributes: NodeInfo::new(),
            },
        ])
    }
}

struct StubGraph;

#[async_trait]
impl GraphNetwork for StubGraph {
    async fn add_node_to_network(
        &self,
        _owner: &str,
        _node: &str,
        _source: &str,
    ) -> Result<(), GraphClientError> {
        Ok(())
    }

    async fn apply_merge(&self, _absorbed: &str, _canonical: &str) -> Result<(), GraphClientError> {
        Ok(())
    }
}

async fn test_app(fail_scorer: bool) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool: SqlitePool = nexus_er::db::init_database_pool(&dir.path().join("nexus.db"))
        .await
        .unwrap();

    let state = AppState::new(
        pool,
        EventBus::new(64),
        Arc::new(StubScorer { fail: fail_scorer }),
        Arc::new(StubImport),
        Arc::new(StubGraph),
    );

    (build_router(state), dir)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn compare_body(node_a: &str, node_b: &str, first_a: &str, first_b: &str) -> serde_json::Value {
    serde_json::json!({
        "node_a": node_a,
        "node_b": node_b,
        "node_a_info": { "firstName": first_a },
        "node_b_info": { "firstName": first_b },
    })
}

/// POST /comparisons, returning the new comparison id
async fn create_comparison(app: &Router) -> Uuid {
    let response = app
        .clone()
        .oneshot(post_json("/comparisons", compare_body("u1", "u2", "Jon", "John")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["comparison"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_compare_then_query_pending() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    let response = app.clone().oneshot(get("/comparisons/pending")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let pending = body.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], id.to_string());
    assert_eq!(pending[0]["node_a"], "u1");
    assert_eq!(pending[0]["user_decision"], "pending");
}

#[tokio::test]
async fn test_same_node_twice_is_bad_request() {
    let (app, _dir) = test_app(false).await;

    let response = app
        .oneshot(post_json("/comparisons", compare_body("u1", "u1", "Jon", "Jon")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_dissimilar_pair_is_unprocessable() {
    let (app, _dir) = test_app(false).await;

    let response = app
        .oneshot(post_json("/comparisons", compare_body("u1", "u2", "Zed", "Amy")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNPROCESSABLE");
}

#[tokio::test]
async fn test_analyze_and_detail_round_trip() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(&format!("/comparisons/{}/analyze", id), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/comparisons/{}", id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let details = body.as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["similarity_score"], 0.85);
    assert_eq!(details[0]["confidence"], "high");
}

#[tokio::test]
async fn test_scorer_outage_maps_to_bad_gateway() {
    let (app, _dir) = test_app(true).await;
    let id = create_comparison(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(&format!("/comparisons/{}/analyze", id), serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_confirm_merge_flow() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/comparisons/{}/confirm", id),
            serde_json::json!({ "decision": "same" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Second confirmation conflicts
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/comparisons/{}/confirm", id),
            serde_json::json!({ "decision": "different" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Merge keeping u1 absorbs u2
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/comparisons/{}/merge", id),
            serde_json::json!({ "keep_node": "u1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["merge"].is_string());

    let response = app.clone().oneshot(get("/merges/node/u1")).await.unwrap();
    let body = body_json(response).await;
    let merges = body.as_array().unwrap();
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0]["absorbed"], "u2");
    assert_eq!(merges[0]["canonical"], "u1");
    assert_eq!(merges[0]["merged_by"], "user");

    // Applying the merge to the graph is a separate, caller-driven step
    let merge_id = merges[0]["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/merges/{}/apply", merge_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_apply_unknown_merge_is_not_found() {
    let (app, _dir) = test_app(false).await;

    let response = app
        .oneshot(post_json(
            &format!("/merges/{}/apply", Uuid::new_v4()),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_merge_without_same_decision_conflicts() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/comparisons/{}/merge", id),
            serde_json::json!({ "keep_node": "u1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_decision_is_bad_request() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/comparisons/{}/confirm", id),
            serde_json::json!({ "decision": "maybe" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_comparison_is_not_found() {
    let (app, _dir) = test_app(false).await;

    let response = app
        .oneshot(post_json(
            &format!("/comparisons/{}/confirm", Uuid::new_v4()),
            serde_json::json!({ "decision": "same" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_cancel_removes_comparison() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    let response = app
        .clone()
        .oneshot(delete(&format!("/comparisons/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Read queries return empty collections, not errors
    let response = app
        .clone()
        .oneshot(get(&format!("/comparisons/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let response = app.clone().oneshot(get("/comparisons/pair/u1/u2")).await.unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pair_query_accepts_either_order() {
    let (app, _dir) = test_app(false).await;
    let id = create_comparison(&app).await;

    for uri in ["/comparisons/pair/u1/u2", "/comparisons/pair/u2/u1"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        let body = body_json(response).await;
        let found = body.as_array().unwrap();
        assert_eq!(found.len(), 1, "query {} should find the pair", uri);
        assert_eq!(found[0]["id"], id.to_string());
    }
}

#[tokio::test]
async fn test_sync_connection_added_deduplicates() {
    let (app, _dir) = test_app(false).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/sync/connection-added",
            serde_json::json!({ "account": "acct-1", "connection": "conn-2" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["owner"], "user-1");
    assert_eq!(body["node"], "conn-1");
    assert_eq!(body["deduplicated"], true);
}

#[tokio::test]
async fn test_sync_unknown_account_is_not_found() {
    let (app, _dir) = test_app(false).await;

    let response = app
        .oneshot(post_json(
            "/sync/connection-added",
            serde_json::json!({ "account": "acct-x", "connection": "conn-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app(false).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "nexus-er");
}
