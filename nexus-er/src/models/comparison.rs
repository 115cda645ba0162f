//! Comparison entity: one open or resolved disambiguation attempt per
//! unordered node pair

use crate::models::node_info::NodeInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User decision state machine for a comparison
///
/// `pending -> same` or `pending -> different` on confirmation; a
/// re-comparison with new evidence re-opens a decided comparison back to
/// `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserDecision {
    Pending,
    Same,
    Different,
}

impl UserDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserDecision::Pending => "pending",
            UserDecision::Same => "same",
            UserDecision::Different => "different",
        }
    }
}

impl fmt::Display for UserDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserDecision {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UserDecision::Pending),
            "same" => Ok(UserDecision::Same),
            "different" => Ok(UserDecision::Different),
            _ => Err(()),
        }
    }
}

/// Confidence tier reported by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(()),
        }
    }
}

/// A tracked disambiguation attempt between two nodes
///
/// `node_a` and `node_b` are always stored in canonical order so a pair
/// has at most one comparison regardless of the order a caller supplied
/// them. Scoring fields stay unset until `analyzeComparison` runs (or the
/// identity fast-path fires).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// Comparison UUID
    pub id: Uuid,
    /// First node of the pair (lexicographic minimum)
    pub node_a: String,
    /// Second node of the pair (lexicographic maximum)
    pub node_b: String,
    /// Similarity score in [0, 1]; 1.0 means definitely the same entity
    pub similarity_score: Option<f64>,
    /// Human-readable justification from the scorer
    pub reasoning: Option<String>,
    /// Confidence tier from the scorer
    pub confidence: Option<Confidence>,
    /// Decision state machine
    pub user_decision: UserDecision,
    /// When the decision was recorded
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the comparison was first created
    pub created_at: DateTime<Utc>,
    /// Snapshot of node_a's attributes at comparison time
    pub node_a_info: Option<NodeInfo>,
    /// Snapshot of node_b's attributes at comparison time
    pub node_b_info: Option<NodeInfo>,
}

impl Comparison {
    /// Whether scoring fields have been populated
    pub fn is_scored(&self) -> bool {
        self.similarity_score.is_some()
    }

    /// Whether `node` is one of the pair
    pub fn involves(&self, node: &str) -> bool {
        self.node_a == node || self.node_b == node
    }

    /// The other node of the pair, given one of them
    pub fn other_node(&self, node: &str) -> Option<&str> {
        if self.node_a == node {
            Some(&self.node_b)
        } else if self.node_b == node {
            Some(&self.node_a)
        } else {
            None
        }
    }
}

/// Canonical key for an unordered node pair
///
/// Every read and write of a comparison goes through this ordering, which
/// is what lets storage enforce pair uniqueness with a plain unique index.
pub fn canonical_key<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Canonicalize a node pair together with their attribute snapshots
pub fn canonicalize_pair(
    node_a: String,
    node_b: String,
    info_a: Option<NodeInfo>,
    info_b: Option<NodeInfo>,
) -> (String, String, Option<NodeInfo>, Option<NodeInfo>) {
    if node_a <= node_b {
        (node_a, node_b, info_a, info_b)
    } else {
        (node_b, node_a, info_b, info_a)
    }
}
