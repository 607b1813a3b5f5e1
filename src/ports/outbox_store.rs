//! OutboxStore port - durable event table for the transactional outbox.
//!
//! Events are appended in the same database transaction as the business
//! write they announce (see `DonationStore::resolve_payment`), then drained
//! by the outbox processor. An event is claimed by a single processor before
//! it acts (`Pending -> Processing`), and a failed dispatch returns it to
//! `Pending` with the retry count incremented - never silently dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, StateMachine, Timestamp};

/// Delivery status of an outbox event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Written, waiting to be claimed.
    Pending,
    /// Claimed by a processor; hidden from other ticks.
    Processing,
    /// Dispatched successfully. Terminal.
    Completed,
    /// Retries exhausted; needs operator attention. Terminal.
    Failed,
}

impl OutboxStatus {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Processing => "processing",
            OutboxStatus::Completed => "completed",
            OutboxStatus::Failed => "failed",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OutboxStatus::Pending),
            "processing" => Some(OutboxStatus::Processing),
            "completed" => Some(OutboxStatus::Completed),
            "failed" => Some(OutboxStatus::Failed),
            _ => None,
        }
    }
}

impl StateMachine for OutboxStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OutboxStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Processing, Completed)
                | (Processing, Pending) // failed dispatch, retry later
                | (Processing, Failed) // retries exhausted
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OutboxStatus::*;
        match self {
            Pending => vec![Processing],
            Processing => vec![Completed, Pending, Failed],
            Completed | Failed => vec![],
        }
    }
}

/// A durable event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub event_type: String,
    pub payload: JsonValue,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An event to be appended; identity and bookkeeping are assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOutboxEvent {
    pub event_type: String,
    pub payload: JsonValue,
}

impl NewOutboxEvent {
    /// Builds an event from a serializable payload.
    pub fn new<T: Serialize>(event_type: &str, payload: &T) -> Result<Self, DomainError> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            DomainError::new(
                crate::domain::foundation::ErrorCode::InternalError,
                format!("Failed to serialize outbox payload: {}", e),
            )
        })?;
        Ok(Self {
            event_type: event_type.to_string(),
            payload,
        })
    }
}

/// Port for the durable outbox table.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Append a standalone event (outside any business transaction).
    ///
    /// Events that must be atomic with a business write are appended through
    /// the owning store's transactional method instead.
    async fn append(&self, event: NewOutboxEvent) -> Result<OutboxEvent, DomainError>;

    /// Fetch up to `limit` pending events, oldest first.
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxEvent>, DomainError>;

    /// Claim an event before dispatching it.
    async fn mark_processing(&self, id: Uuid) -> Result<(), DomainError>;

    /// Record a successful dispatch.
    async fn mark_completed(&self, id: Uuid) -> Result<(), DomainError>;

    /// Record a failed dispatch: increments the retry count, stores the
    /// error, and returns the event to `Pending` (or parks it as `Failed`
    /// when `requeue` is false).
    async fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        requeue: bool,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_allows_the_retry_cycle() {
        assert!(OutboxStatus::Pending.can_transition_to(&OutboxStatus::Processing));
        assert!(OutboxStatus::Processing.can_transition_to(&OutboxStatus::Completed));
        assert!(OutboxStatus::Processing.can_transition_to(&OutboxStatus::Pending));
        assert!(OutboxStatus::Processing.can_transition_to(&OutboxStatus::Failed));
    }

    #[test]
    fn completed_and_failed_are_terminal() {
        assert!(OutboxStatus::Completed.is_terminal());
        assert!(OutboxStatus::Failed.is_terminal());
        assert!(!OutboxStatus::Pending.is_terminal());
        assert!(!OutboxStatus::Processing.is_terminal());
    }

    #[test]
    fn pending_cannot_jump_straight_to_completed() {
        assert!(!OutboxStatus::Pending.can_transition_to(&OutboxStatus::Completed));
    }

    #[test]
    fn new_outbox_event_serializes_payload() {
        #[derive(Serialize)]
        struct P {
            value: u32,
        }

        let event = NewOutboxEvent::new("TEST_EVENT", &P { value: 7 }).unwrap();
        assert_eq!(event.event_type, "TEST_EVENT");
        assert_eq!(event.payload["value"], 7);
    }

    #[test]
    fn status_roundtrips_through_storage_form() {
        for status in [
            OutboxStatus::Pending,
            OutboxStatus::Processing,
            OutboxStatus::Completed,
            OutboxStatus::Failed,
        ] {
            assert_eq!(OutboxStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OutboxStatus::parse("archived"), None);
    }
}
