//! MessageQueue port - lease-based message queue.
//!
//! Semantics follow the usual cloud queue model: a received message is
//! hidden from other consumers for the visibility window; deleting it
//! acknowledges it, and a message that is neither deleted nor extended
//! becomes redeliverable when its lease expires. Mutual exclusion across
//! consumer instances comes entirely from the lease - consumers share no
//! in-memory state.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::DomainError;

/// Opaque handle required to delete a specific delivery of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(pub String);

impl ReceiptHandle {
    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One delivered message.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// Stable message id (same across redeliveries).
    pub id: String,
    /// Handle for this delivery.
    pub receipt: ReceiptHandle,
    /// Raw body; consumers parse and validate it themselves.
    pub body: String,
}

/// Parameters for one receive call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceiveOptions {
    /// Upper bound on messages returned.
    pub max_messages: u32,
    /// Long-poll wait when the queue is empty.
    pub wait: Duration,
    /// Visibility lease for each returned message.
    pub visibility: Duration,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait: Duration::from_secs(20),
            visibility: Duration::from_secs(300),
        }
    }
}

/// Port for the shared donation message queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue a message body.
    async fn send(&self, body: String) -> Result<(), DomainError>;

    /// Receive up to `max_messages`, leasing each for the visibility window.
    ///
    /// Blocks up to `wait` when the queue is empty; an empty result is not
    /// an error.
    async fn receive(&self, options: ReceiveOptions) -> Result<Vec<QueueMessage>, DomainError>;

    /// Acknowledge (permanently remove) a delivered message.
    async fn delete(&self, receipt: &ReceiptHandle) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_queue_is_object_safe() {
        fn _accepts_dyn(_queue: &dyn MessageQueue) {}
    }

    #[test]
    fn default_receive_options_match_consumer_contract() {
        let options = ReceiveOptions::default();
        assert_eq!(options.max_messages, 10);
        assert_eq!(options.wait, Duration::from_secs(20));
        assert_eq!(options.visibility, Duration::from_secs(300));
    }
}
