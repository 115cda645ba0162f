//! Merge entity: the immutable record that one node was folded into
//! another

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Who authorized a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergedBy {
    /// Automatic merge from an exact-identifier match
    System,
    /// Human-confirmed merge
    User,
}

impl MergedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergedBy::System => "system",
            MergedBy::User => "user",
        }
    }
}

impl fmt::Display for MergedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergedBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(MergedBy::System),
            "user" => Ok(MergedBy::User),
            _ => Err(()),
        }
    }
}

/// Append-only record that `absorbed` was folded into `canonical`
///
/// Merges are never mutated or deleted; they form the audit trail the
/// graph engine consumes when re-pointing edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merge {
    /// Merge UUID
    pub id: Uuid,
    /// The node that no longer stands alone
    pub absorbed: String,
    /// The node that remains
    pub canonical: String,
    /// The comparison that authorized this merge
    pub comparison: Uuid,
    /// When the merge was recorded
    pub merged_at: DateTime<Utc>,
    /// Who authorized the merge
    pub merged_by: MergedBy,
}
