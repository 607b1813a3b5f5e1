//! In-memory queue with visibility leases.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::ports::{MessageQueue, QueueMessage, ReceiveOptions, ReceiptHandle};

struct Stored {
    id: String,
    body: String,
}

struct Leased {
    message: Stored,
    receipt: String,
    expires_at: Instant,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Stored>,
    leased: Vec<Leased>,
}

/// In-memory `MessageQueue` with real lease expiry.
#[derive(Default)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages currently visible (not leased).
    pub fn ready_len(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        Self::reclaim_expired(&mut state);
        state.ready.len()
    }

    /// Messages currently leased out.
    pub fn leased_len(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        Self::reclaim_expired(&mut state);
        state.leased.len()
    }

    /// Force all leases to expire (test hook for redelivery paths).
    pub fn expire_leases(&self) {
        let mut state = self.state.lock().unwrap();
        for lease in &mut state.leased {
            lease.expires_at = Instant::now() - Duration::from_millis(1);
        }
    }

    fn reclaim_expired(state: &mut QueueState) {
        let now = Instant::now();
        let mut index = 0;
        while index < state.leased.len() {
            if state.leased[index].expires_at <= now {
                let lease = state.leased.swap_remove(index);
                state.ready.push_back(lease.message);
            } else {
                index += 1;
            }
        }
    }

    fn try_receive(&self, options: &ReceiveOptions) -> Vec<QueueMessage> {
        let mut state = self.state.lock().unwrap();
        Self::reclaim_expired(&mut state);

        let mut delivered = Vec::new();
        while delivered.len() < options.max_messages as usize {
            let Some(message) = state.ready.pop_front() else {
                break;
            };
            let receipt = Uuid::new_v4().to_string();
            delivered.push(QueueMessage {
                id: message.id.clone(),
                receipt: ReceiptHandle(receipt.clone()),
                body: message.body.clone(),
            });
            state.leased.push(Leased {
                message,
                receipt,
                expires_at: Instant::now() + options.visibility,
            });
        }
        delivered
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, body: String) -> Result<(), DomainError> {
        self.state.lock().unwrap().ready.push_back(Stored {
            id: Uuid::new_v4().to_string(),
            body,
        });
        Ok(())
    }

    async fn receive(&self, options: ReceiveOptions) -> Result<Vec<QueueMessage>, DomainError> {
        let deadline = Instant::now() + options.wait;
        loop {
            let messages = self.try_receive(&options);
            if !messages.is_empty() || Instant::now() >= deadline {
                return Ok(messages);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn delete(&self, receipt: &ReceiptHandle) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.leased.retain(|lease| lease.receipt != receipt.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ReceiveOptions {
        ReceiveOptions {
            max_messages: 10,
            wait: Duration::from_millis(0),
            visibility: Duration::from_secs(300),
        }
    }

    #[tokio::test]
    async fn received_message_is_hidden_until_lease_expires() {
        let queue = InMemoryQueue::new();
        queue.send("one".to_string()).await.unwrap();

        let first = queue.receive(options()).await.unwrap();
        assert_eq!(first.len(), 1);

        // Leased: a second receive sees nothing.
        let second = queue.receive(options()).await.unwrap();
        assert!(second.is_empty());

        // Lease expiry makes it redeliverable with the same id.
        queue.expire_leases();
        let third = queue.receive(options()).await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].id, first[0].id);
        assert_ne!(third[0].receipt, first[0].receipt);
    }

    #[tokio::test]
    async fn delete_acknowledges_permanently() {
        let queue = InMemoryQueue::new();
        queue.send("one".to_string()).await.unwrap();

        let delivered = queue.receive(options()).await.unwrap();
        queue.delete(&delivered[0].receipt).await.unwrap();
        queue.expire_leases();

        assert!(queue.receive(options()).await.unwrap().is_empty());
        assert_eq!(queue.ready_len(), 0);
        assert_eq!(queue.leased_len(), 0);
    }

    #[tokio::test]
    async fn receive_respects_max_messages() {
        let queue = InMemoryQueue::new();
        for i in 0..15 {
            queue.send(format!("m{}", i)).await.unwrap();
        }

        let mut opts = options();
        opts.max_messages = 10;
        let batch = queue.receive(opts).await.unwrap();

        assert_eq!(batch.len(), 10);
        assert_eq!(queue.ready_len(), 5);
    }

    #[tokio::test]
    async fn empty_queue_returns_after_wait() {
        let queue = InMemoryQueue::new();
        let mut opts = options();
        opts.wait = Duration::from_millis(30);

        let start = Instant::now();
        let batch = queue.receive(opts).await.unwrap();

        assert!(batch.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
