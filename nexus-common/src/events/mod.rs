//! Event types for the Nexus event system
//!
//! Provides shared event definitions and EventBus for all Nexus modules.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Nexus event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All modules use this central enum for type safety and
/// exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NexusEvent {
    /// A comparison was created for a node pair
    ///
    /// Triggers:
    /// - SSE: Review UI refreshes its pending list
    ComparisonCreated {
        /// Comparison UUID
        comparison: Uuid,
        /// First node of the pair (canonical order)
        node_a: String,
        /// Second node of the pair (canonical order)
        node_b: String,
        /// When the comparison was created
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A comparison received its similarity assessment
    ///
    /// Fires for both scorer results and identity fast-path matches.
    ComparisonScored {
        /// Comparison UUID
        comparison: Uuid,
        /// Similarity score in [0, 1]
        similarity_score: f64,
        /// Confidence tier ("high" | "medium" | "low")
        confidence: String,
        /// When the scores were recorded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A user recorded a decision on a comparison
    ComparisonConfirmed {
        /// Comparison UUID
        comparison: Uuid,
        /// The recorded decision ("same" | "different")
        decision: String,
        /// When the decision was recorded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pending comparison was cancelled and removed
    ComparisonCancelled {
        /// Comparison UUID
        comparison: Uuid,
        /// When the comparison was removed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A merge record was written for a confirmed pair
    ///
    /// Triggers:
    /// - Graph engine: re-point the absorbed node's edges onto the
    ///   canonical node (invoked by the caller, not chained here)
    NodesMerged {
        /// Merge UUID
        merge: Uuid,
        /// The node that no longer stands alone
        absorbed: String,
        /// The node that remains
        canonical: String,
        /// The comparison that authorized this merge
        comparison: Uuid,
        /// When the merge was recorded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An imported connection was forwarded to the graph engine
    ConnectionSynced {
        /// Import account the connection belongs to
        account: String,
        /// The node forwarded to the graph engine
        node: String,
        /// True when an existing node was reused instead of the new one
        deduplicated: bool,
        /// When the sync ran
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl NexusEvent {
    /// Event type name for SSE event framing
    pub fn event_type(&self) -> &'static str {
        match self {
            NexusEvent::ComparisonCreated { .. } => "ComparisonCreated",
            NexusEvent::ComparisonScored { .. } => "ComparisonScored",
            NexusEvent::ComparisonConfirmed { .. } => "ComparisonConfirmed",
            NexusEvent::ComparisonCancelled { .. } => "ComparisonCancelled",
            NexusEvent::NodesMerged { .. } => "NodesMerged",
            NexusEvent::ConnectionSynced { .. } => "ConnectionSynced",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<NexusEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<NexusEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening, which is normal when
    /// no SSE client is connected.
    pub fn emit(&self, event: NexusEvent) -> Result<usize, broadcast::error::SendError<NexusEvent>> {
        self.tx.send(event)
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(NexusEvent::ComparisonCancelled {
            comparison: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "ComparisonCancelled");
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(16);
        let result = bus.emit(NexusEvent::ComparisonCancelled {
            comparison: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = NexusEvent::ConnectionSynced {
            account: "acct-1".to_string(),
            node: "conn-1".to_string(),
            deduplicated: true,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ConnectionSynced");
        assert_eq!(json["deduplicated"], true);
    }
}
