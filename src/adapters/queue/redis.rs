//! Redis-backed queue using the reliable-queue pattern.
//!
//! Keys per queue `name`:
//! - `{name}:ready`    - list of message ids awaiting delivery
//! - `{name}:leased`   - sorted set of message ids scored by lease expiry
//! - `{name}:messages` - hash of message id -> body
//!
//! `receive` first moves expired ids from the leased set back to the ready
//! list, then pops up to the batch size and leases each until
//! `now + visibility`. `delete` removes the id from the leased set and the
//! body hash. The lease in the sorted set is what hides an in-flight
//! message from other consumers.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{MessageQueue, QueueMessage, ReceiveOptions, ReceiptHandle};

/// Redis `MessageQueue` adapter.
pub struct RedisQueue {
    client: redis::Client,
    ready_key: String,
    leased_key: String,
    messages_key: String,
}

impl RedisQueue {
    pub fn new(client: redis::Client, name: &str) -> Self {
        Self {
            client,
            ready_key: format!("{}:ready", name),
            leased_key: format!("{}:leased", name),
            messages_key: format!("{}:messages", name),
        }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, DomainError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(queue_error)
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    async fn reclaim_expired(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
    ) -> Result<(), DomainError> {
        let now = Self::now_millis();
        let expired: Vec<String> = conn
            .zrangebyscore(&self.leased_key, i64::MIN, now)
            .await
            .map_err(queue_error)?;

        for id in expired {
            // Remove-then-requeue; losing the race to another consumer's
            // reclaim just means the other instance requeued it first.
            let removed: i64 = conn
                .zrem(&self.leased_key, &id)
                .await
                .map_err(queue_error)?;
            if removed > 0 {
                let _: () = conn
                    .lpush(&self.ready_key, &id)
                    .await
                    .map_err(queue_error)?;
            }
        }
        Ok(())
    }

    async fn pop_batch(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        options: &ReceiveOptions,
    ) -> Result<Vec<QueueMessage>, DomainError> {
        let mut delivered = Vec::new();
        let lease_deadline = Self::now_millis() + options.visibility.as_millis() as i64;

        while delivered.len() < options.max_messages as usize {
            let id: Option<String> = conn.rpop(&self.ready_key, None).await.map_err(queue_error)?;
            let Some(id) = id else {
                break;
            };

            let body: Option<String> = conn
                .hget(&self.messages_key, &id)
                .await
                .map_err(queue_error)?;
            let Some(body) = body else {
                // Body already acknowledged elsewhere; drop the orphan id.
                continue;
            };

            let _: () = conn
                .zadd(&self.leased_key, &id, lease_deadline)
                .await
                .map_err(queue_error)?;

            delivered.push(QueueMessage {
                receipt: ReceiptHandle(id.clone()),
                id,
                body,
            });
        }
        Ok(delivered)
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn send(&self, body: String) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        let id = Uuid::new_v4().to_string();
        let _: () = conn
            .hset(&self.messages_key, &id, body)
            .await
            .map_err(queue_error)?;
        let _: () = conn
            .lpush(&self.ready_key, &id)
            .await
            .map_err(queue_error)?;
        Ok(())
    }

    async fn receive(&self, options: ReceiveOptions) -> Result<Vec<QueueMessage>, DomainError> {
        let mut conn = self.connection().await?;
        let deadline = SystemTime::now() + options.wait;

        loop {
            self.reclaim_expired(&mut conn).await?;
            let batch = self.pop_batch(&mut conn, &options).await?;
            if !batch.is_empty() || SystemTime::now() >= deadline {
                return Ok(batch);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn delete(&self, receipt: &ReceiptHandle) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .zrem(&self.leased_key, receipt.as_str())
            .await
            .map_err(queue_error)?;
        let _: () = conn
            .hdel(&self.messages_key, receipt.as_str())
            .await
            .map_err(queue_error)?;
        Ok(())
    }
}

fn queue_error(error: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::QueueError, error.to_string())
}

/// Redis-backed campaign cache invalidation.
pub struct RedisCampaignCache {
    client: redis::Client,
    prefix: String,
}

impl RedisCampaignCache {
    pub fn new(client: redis::Client, prefix: &str) -> Self {
        Self {
            client,
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl crate::ports::CampaignCache for RedisCampaignCache {
    async fn invalidate(
        &self,
        id: crate::domain::foundation::CampaignId,
    ) -> Result<(), DomainError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;
        let _: () = conn
            .del(format!("{}:{}", self.prefix, id))
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;
        Ok(())
    }
}
