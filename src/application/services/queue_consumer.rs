//! QueueConsumer - long-poll loop over the shared donation queue.
//!
//! Per-message policy:
//! - empty or unparsable body: poison, delete immediately;
//! - missing `eventType` or missing required fields for a known type:
//!   malformed, delete immediately (a redelivery would fail identically);
//! - known type, handler succeeds: delete;
//! - known type, handler fails: keep the message, the visibility lease
//!   expiry redelivers it;
//! - unknown type: leave untouched, it may belong to another consumer.
//!
//! The loop itself never terminates on a transient poll error; it pauses
//! and tries again.

use std::sync::Arc;

use tokio::sync::watch;

use crate::application::handlers::PendingDonationHandler;
use crate::config::QueueConfig;
use crate::domain::donation::QueueEvent;
use crate::domain::foundation::DomainError;
use crate::ports::{MessageQueue, QueueMessage, ReceiveOptions};

/// Event type handled by this consumer.
const TYPE_DONATION_PENDING: &str = "DONATION_PENDING";

/// Background consumer of the donation queue.
pub struct QueueConsumer {
    queue: Arc<dyn MessageQueue>,
    handler: Arc<PendingDonationHandler>,
    config: QueueConfig,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        handler: Arc<PendingDonationHandler>,
        config: QueueConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Run the consumer loop until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(queue = %self.config.name, "Queue consumer started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Queue consumer stopping");
                        return;
                    }
                }

                result = self.poll_once() => {
                    if let Err(error) = result {
                        tracing::error!(error = %error, "Queue poll failed; pausing before retry");
                        tokio::select! {
                            _ = shutdown.changed() => {
                                if *shutdown.borrow() { return; }
                            }
                            _ = tokio::time::sleep(self.config.error_pause()) => {}
                        }
                    }
                }
            }
        }
    }

    /// Receive one batch and process each message.
    pub async fn poll_once(&self) -> Result<usize, DomainError> {
        let messages = self
            .queue
            .receive(ReceiveOptions {
                max_messages: self.config.max_messages,
                wait: self.config.wait(),
                visibility: self.config.visibility(),
            })
            .await?;

        let count = messages.len();
        for message in messages {
            self.process_message(message).await;
        }
        Ok(count)
    }

    async fn process_message(&self, message: QueueMessage) {
        let disposition = self.dispatch(&message).await;

        match disposition {
            Disposition::Delete => {
                if let Err(error) = self.queue.delete(&message.receipt).await {
                    tracing::error!(
                        message_id = %message.id,
                        error = %error,
                        "Failed to delete queue message"
                    );
                }
            }
            Disposition::Retain => {
                // Lease expiry will redeliver.
            }
            Disposition::Leave => {
                // Not ours; other consumers of the channel will claim it.
            }
        }
    }

    async fn dispatch(&self, message: &QueueMessage) -> Disposition {
        if message.body.trim().is_empty() {
            tracing::warn!(message_id = %message.id, "Empty message body; deleting");
            return Disposition::Delete;
        }

        let value: serde_json::Value = match serde_json::from_str(&message.body) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(
                    message_id = %message.id,
                    error = %error,
                    body_prefix = %truncate(&message.body, 100),
                    "Invalid JSON in queue message; deleting"
                );
                return Disposition::Delete;
            }
        };

        let Some(event_type) = value.get("eventType").and_then(|v| v.as_str()) else {
            tracing::warn!(message_id = %message.id, "Message missing eventType; deleting");
            return Disposition::Delete;
        };

        match event_type {
            TYPE_DONATION_PENDING => match serde_json::from_value::<QueueEvent>(value) {
                Ok(event) => match self.handler.handle(event).await {
                    Ok(()) => Disposition::Delete,
                    Err(error) => {
                        tracing::error!(
                            message_id = %message.id,
                            error = %error,
                            "Handler failed; leaving message for redelivery"
                        );
                        Disposition::Retain
                    }
                },
                Err(error) => {
                    tracing::error!(
                        message_id = %message.id,
                        error = %error,
                        "DONATION_PENDING message missing required fields; deleting"
                    );
                    Disposition::Delete
                }
            },
            other => {
                tracing::debug!(
                    message_id = %message.id,
                    event_type = other,
                    "Unknown eventType; leaving for other consumers"
                );
                Disposition::Leave
            }
        }
    }
}

enum Disposition {
    /// Acknowledge: processed or poison.
    Delete,
    /// Keep leased; redelivered after the lease expires.
    Retain,
    /// Not deleted and not ours.
    Leave,
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let prefix: String = s.chars().take(max).collect();
        format!("{}...", prefix)
    }
}
