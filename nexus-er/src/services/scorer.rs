//! External similarity scorer client
//!
//! One HTTP call per analysis, no caching and no retries: the engine
//! guarantees at-most-once scoring per comparison, so the client stays a
//! pure boundary. Failures are surfaced to the caller, which may retry
//! the analysis later.

use crate::models::{Confidence, NodeInfo};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Scorer client errors
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Scoring service API key not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Scoring service error {0}: {1}")]
    ApiError(u16, String),

    #[error("Empty response from scoring service")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result of one scoring call
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// Similarity in [0, 1]; 1.0 means definitely the same entity
    pub similarity_score: f64,
    /// Confidence tier
    pub confidence: Confidence,
    /// Free-text justification
    pub reasoning: String,
}

/// Similarity scoring capability
///
/// Narrow seam so the lifecycle manager can be exercised with a
/// deterministic stub instead of a live reasoning service.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Assess whether two attribute snapshots describe the same entity
    async fn score(&self, info_a: &NodeInfo, info_b: &NodeInfo)
        -> Result<ScoreOutcome, ScorerError>;
}

/// Scorer configuration, injected at construction
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ScorerConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

/// Gemini-backed similarity scorer
pub struct GeminiScorer {
    http_client: reqwest::Client,
    config: ScorerConfig,
}

impl GeminiScorer {
    /// Build a scorer from injected configuration
    ///
    /// A missing API key is not an error here: the service must start
    /// without one, and each scoring call fails with MissingCredentials
    /// until the key is configured.
    pub fn new(config: ScorerConfig) -> Result<Self, ScorerError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScorerError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl SimilarityScorer for GeminiScorer {
    async fn score(
        &self,
        info_a: &NodeInfo,
        info_b: &NodeInfo,
    ) -> Result<ScoreOutcome, ScorerError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ScorerError::MissingCredentials);
        }

        let prompt = build_prompt(info_a, info_b);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );

        tracing::debug!(model = %self.config.model, "Querying scoring service");

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "contents": [{
                    "parts": [{ "text": prompt }],
                }],
            }))
            .send()
            .await
            .map_err(|e| ScorerError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScorerError::ApiError(status.as_u16(), error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScorerError::ParseError(e.to_string()))?;

        let text = body
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(ScorerError::EmptyResponse)?;

        parse_score_reply(&text)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Build the disambiguation prompt for two attribute snapshots
fn build_prompt(info_a: &NodeInfo, info_b: &NodeInfo) -> String {
    let info_a = serde_json::to_string_pretty(info_a)
        .unwrap_or_else(|_| "No information provided for node A".to_string());
    let info_b = serde_json::to_string_pretty(info_b)
        .unwrap_or_else(|_| "No information provided for node B".to_string());

    format!(
        r#"You are an entity disambiguation assistant. Your task is to determine whether two nodes in a network represent the same real-world person or entity.

Node A Information:
{info_a}

Node B Information:
{info_b}

Analyze the information provided and determine:
1. Whether these two nodes likely represent the same person/entity
2. Your confidence level (high, medium, or low)
3. Your reasoning for the decision

Consider factors such as:
- Name similarity (including variations, nicknames, abbreviations)
- Location/affiliation overlap
- Professional information (companies, positions, education)
- Any other identifying information

Return ONLY a JSON object with the following structure:
{{
  "similarityScore": <number between 0.0 and 1.0, where 1.0 means definitely the same>,
  "confidence": <"high" | "medium" | "low">,
  "reasoning": <string explaining your analysis>
}}

Example response:
{{
  "similarityScore": 0.85,
  "confidence": "high",
  "reasoning": "Both nodes share the same full name (John Smith), work at the same company (Acme Corp), and are located in the same city (Boston). The email addresses are different but this could be due to different accounts."
}}"#
    )
}

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Parse a scorer reply, tolerating prose and markdown around the JSON
///
/// Out-of-range or missing fields degrade to defaults rather than
/// failing the call: score clamps into [0, 1] (0.5 when absent),
/// confidence falls back to medium, reasoning to a placeholder.
pub fn parse_score_reply(text: &str) -> Result<ScoreOutcome, ScorerError> {
    let raw = JSON_OBJECT
        .find(text)
        .ok_or_else(|| ScorerError::ParseError("no JSON object in reply".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(raw.as_str())
        .map_err(|e| ScorerError::ParseError(e.to_string()))?;

    let similarity_score = value
        .get("similarityScore")
        .and_then(|v| v.as_f64())
        .map(|s| s.clamp(0.0, 1.0))
        .unwrap_or(0.5);

    let confidence = value
        .get("confidence")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Confidence>().ok())
        .unwrap_or(Confidence::Medium);

    let reasoning = value
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("No reasoning provided")
        .to_string();

    Ok(ScoreOutcome {
        similarity_score,
        confidence,
        reasoning,
    })
}
