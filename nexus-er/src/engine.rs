//! Comparison lifecycle manager and merge recorder
//!
//! Owns the comparison state machine (create/update, on-demand scoring,
//! confirmation, cancellation) and the append-only merge log. All reads
//! and writes go through the canonical node ordering, so an unordered
//! pair maps to exactly one comparison however callers ordered their
//! arguments.

use crate::db;
use crate::error::EngineError;
use crate::models::{
    canonical_key, canonicalize_pair, Comparison, Merge, MergedBy, NodeInfo, UserDecision,
};
use crate::services::profile_url::shared_profile_identity;
use crate::services::scorer::SimilarityScorer;
use crate::services::similarity::worth_comparing;
use chrono::Utc;
use nexus_common::events::{EventBus, NexusEvent};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Reasoning recorded for identity fast-path matches
const IDENTITY_MATCH_REASONING: &str =
    "Both nodes have the same LinkedIn profile URL, confirming they are the same person.";

/// The disambiguation engine
///
/// One instance is shared across request handlers; every operation is an
/// independent unit of work against the pool. Nothing here holds a lock
/// across the scorer call.
#[derive(Clone)]
pub struct DisambiguationEngine {
    db: SqlitePool,
    scorer: Arc<dyn SimilarityScorer>,
    event_bus: EventBus,
}

impl DisambiguationEngine {
    pub fn new(db: SqlitePool, scorer: Arc<dyn SimilarityScorer>, event_bus: EventBus) -> Self {
        Self {
            db,
            scorer,
            event_bus,
        }
    }

    /// Create or refresh the comparison for a node pair
    ///
    /// The identity fast-path short-circuits everything: matching profile
    /// URLs replace the comparison wholesale with a certain assessment.
    /// Otherwise the similarity pre-filter decides whether the pair is
    /// worth tracking at all, and the comparison is written without
    /// scores - scoring is deferred to an explicit analyze call.
    pub async fn compare_nodes(
        &self,
        node_a: String,
        node_b: String,
        node_a_info: Option<NodeInfo>,
        node_b_info: Option<NodeInfo>,
    ) -> Result<Uuid, EngineError> {
        if node_a == node_b {
            return Err(EngineError::InvalidPair);
        }

        let (node_a, node_b, info_a, info_b) =
            canonicalize_pair(node_a, node_b, node_a_info, node_b_info);

        let existing = db::comparisons::find_by_pair(&self.db, &node_a, &node_b).await?;

        // Identity fast-path: same normalized profile URL means the same
        // person with certainty, no scorer needed.
        if let (Some(info_a), Some(info_b)) = (&info_a, &info_b) {
            if shared_profile_identity(info_a, info_b).is_some() {
                let id = db::comparisons::upsert_identity_match(
                    &self.db,
                    Uuid::new_v4(),
                    &node_a,
                    &node_b,
                    1.0,
                    IDENTITY_MATCH_REASONING,
                    crate::models::Confidence::High,
                    info_a,
                    info_b,
                    Utc::now(),
                )
                .await?;

                tracing::info!(
                    comparison = %id,
                    node_a = %node_a,
                    node_b = %node_b,
                    "Profile URLs match, comparison recorded as certain"
                );

                if existing.is_none() {
                    let _ = self.event_bus.emit(NexusEvent::ComparisonCreated {
                        comparison: id,
                        node_a: node_a.clone(),
                        node_b: node_b.clone(),
                        timestamp: Utc::now(),
                    });
                }
                let _ = self.event_bus.emit(NexusEvent::ComparisonScored {
                    comparison: id,
                    similarity_score: 1.0,
                    confidence: crate::models::Confidence::High.to_string(),
                    timestamp: Utc::now(),
                });

                return Ok(id);
            }

            // Pre-filter: pairs with zero lexical overlap never become
            // comparisons; an already-tracked pair is returned unchanged.
            if !worth_comparing(info_a, info_b) {
                if let Some(existing) = existing {
                    tracing::debug!(
                        comparison = %existing.id,
                        "Pre-filter rejected new snapshots, returning existing comparison unchanged"
                    );
                    return Ok(existing.id);
                }
                return Err(EngineError::NoSimilarity);
            }
        }

        let id = db::comparisons::upsert_unscored(
            &self.db,
            Uuid::new_v4(),
            &node_a,
            &node_b,
            info_a.as_ref(),
            info_b.as_ref(),
            Utc::now(),
        )
        .await?;

        match existing {
            None => {
                tracing::info!(
                    comparison = %id,
                    node_a = %node_a,
                    node_b = %node_b,
                    "Comparison created, awaiting analysis"
                );
                let _ = self.event_bus.emit(NexusEvent::ComparisonCreated {
                    comparison: id,
                    node_a,
                    node_b,
                    timestamp: Utc::now(),
                });
            }
            Some(prior) if prior.user_decision != UserDecision::Pending => {
                tracing::info!(
                    comparison = %id,
                    prior_decision = %prior.user_decision,
                    "New evidence re-opened a decided comparison"
                );
            }
            Some(_) => {}
        }

        Ok(id)
    }

    /// Score a comparison via the external scorer
    ///
    /// Idempotent: an already-scored comparison is a successful no-op, so
    /// concurrent callers converge without double-charging the scorer. A
    /// scorer failure leaves the comparison unscored for a later retry.
    pub async fn analyze_comparison(&self, comparison: Uuid) -> Result<(), EngineError> {
        let existing = db::comparisons::get(&self.db, comparison)
            .await?
            .ok_or(EngineError::NotFound(comparison))?;

        if existing.is_scored() {
            tracing::debug!(comparison = %comparison, "Already analyzed, nothing to do");
            return Ok(());
        }

        let (Some(info_a), Some(info_b)) = (&existing.node_a_info, &existing.node_b_info) else {
            return Err(EngineError::MissingInfo);
        };

        let outcome = match self.scorer.score(info_a, info_b).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(comparison = %comparison, error = %e, "Scoring failed");
                return Err(e.into());
            }
        };

        db::comparisons::record_scores(
            &self.db,
            comparison,
            outcome.similarity_score,
            &outcome.reasoning,
            outcome.confidence,
        )
        .await?;

        tracing::info!(
            comparison = %comparison,
            similarity_score = outcome.similarity_score,
            confidence = %outcome.confidence,
            "Comparison analyzed"
        );

        let _ = self.event_bus.emit(NexusEvent::ComparisonScored {
            comparison,
            similarity_score: outcome.similarity_score,
            confidence: outcome.confidence.to_string(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Record a user decision on a pending comparison
    pub async fn confirm_comparison(
        &self,
        comparison: Uuid,
        decision: &str,
    ) -> Result<(), EngineError> {
        let decision = match decision.parse::<UserDecision>() {
            Ok(UserDecision::Same) => UserDecision::Same,
            Ok(UserDecision::Different) => UserDecision::Different,
            _ => return Err(EngineError::InvalidDecision(decision.to_string())),
        };

        let existing = db::comparisons::get(&self.db, comparison)
            .await?
            .ok_or(EngineError::NotFound(comparison))?;

        if existing.user_decision != UserDecision::Pending {
            return Err(EngineError::AlreadyDecided {
                comparison,
                decision: existing.user_decision.to_string(),
            });
        }

        // Re-checked at write time: a concurrent confirmation may have
        // landed between the read above and this update.
        let confirmed =
            db::comparisons::confirm_pending(&self.db, comparison, decision, Utc::now()).await?;
        if !confirmed {
            return match db::comparisons::get(&self.db, comparison).await? {
                Some(current) => Err(EngineError::AlreadyDecided {
                    comparison,
                    decision: current.user_decision.to_string(),
                }),
                None => Err(EngineError::NotFound(comparison)),
            };
        }

        tracing::info!(comparison = %comparison, decision = %decision, "Comparison confirmed");

        let _ = self.event_bus.emit(NexusEvent::ComparisonConfirmed {
            comparison,
            decision: decision.to_string(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Delete a pending comparison
    ///
    /// Cancellation means "this question should not have been asked":
    /// the record is removed entirely, no tombstone.
    pub async fn cancel_comparison(&self, comparison: Uuid) -> Result<(), EngineError> {
        let existing = db::comparisons::get(&self.db, comparison)
            .await?
            .ok_or(EngineError::NotFound(comparison))?;

        if existing.user_decision != UserDecision::Pending {
            return Err(EngineError::NotCancellable {
                comparison,
                decision: existing.user_decision.to_string(),
            });
        }

        let deleted = db::comparisons::delete_pending(&self.db, comparison).await?;
        if !deleted {
            return match db::comparisons::get(&self.db, comparison).await? {
                Some(current) => Err(EngineError::NotCancellable {
                    comparison,
                    decision: current.user_decision.to_string(),
                }),
                None => Err(EngineError::NotFound(comparison)),
            };
        }

        tracing::info!(comparison = %comparison, "Comparison cancelled and removed");

        let _ = self.event_bus.emit(NexusEvent::ComparisonCancelled {
            comparison,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Record a merge for a comparison confirmed as "same"
    ///
    /// Writes the authoritative (absorbed, canonical) pair; re-pointing
    /// the absorbed node's edges is the graph engine's job, invoked by
    /// the caller afterwards.
    pub async fn merge_nodes(
        &self,
        comparison: Uuid,
        keep_node: &str,
    ) -> Result<Uuid, EngineError> {
        let existing = db::comparisons::get(&self.db, comparison)
            .await?
            .ok_or(EngineError::NotFound(comparison))?;

        if existing.user_decision != UserDecision::Same {
            return Err(EngineError::WrongDecision {
                comparison,
                decision: existing.user_decision.to_string(),
            });
        }

        let Some(absorbed) = existing.other_node(keep_node) else {
            return Err(EngineError::InvalidKeepNode {
                keep: keep_node.to_string(),
                node_a: existing.node_a.clone(),
                node_b: existing.node_b.clone(),
            });
        };

        let merge = Merge {
            id: Uuid::new_v4(),
            absorbed: absorbed.to_string(),
            canonical: keep_node.to_string(),
            comparison,
            merged_at: Utc::now(),
            merged_by: MergedBy::User,
        };

        db::merges::insert(&self.db, &merge).await?;

        tracing::info!(
            merge = %merge.id,
            absorbed = %merge.absorbed,
            canonical = %merge.canonical,
            "Merge recorded"
        );

        let _ = self.event_bus.emit(NexusEvent::NodesMerged {
            merge: merge.id,
            absorbed: merge.absorbed.clone(),
            canonical: merge.canonical.clone(),
            comparison,
            timestamp: Utc::now(),
        });

        Ok(merge.id)
    }

    // ------------------------------------------------------------------
    // Read queries: all return empty collections rather than errors when
    // nothing matches.
    // ------------------------------------------------------------------

    /// The comparison tracking an unordered node pair, if any
    pub async fn comparison_for_pair(
        &self,
        node_a: &str,
        node_b: &str,
    ) -> Result<Option<Comparison>, EngineError> {
        let (first, second) = canonical_key(node_a, node_b);
        Ok(db::comparisons::find_by_pair(&self.db, first, second).await?)
    }

    /// All comparisons involving a node
    pub async fn comparisons_for_node(&self, node: &str) -> Result<Vec<Comparison>, EngineError> {
        Ok(db::comparisons::for_node(&self.db, node).await?)
    }

    /// All comparisons awaiting a decision
    pub async fn pending_comparisons(&self) -> Result<Vec<Comparison>, EngineError> {
        Ok(db::comparisons::pending(&self.db).await?)
    }

    /// Full comparison detail by id, including reasoning and snapshots
    pub async fn comparison_details(
        &self,
        comparison: Uuid,
    ) -> Result<Option<Comparison>, EngineError> {
        Ok(db::comparisons::get(&self.db, comparison).await?)
    }

    /// All merges involving a node
    pub async fn merges_for_node(&self, node: &str) -> Result<Vec<Merge>, EngineError> {
        Ok(db::merges::for_node(&self.db, node).await?)
    }
}
