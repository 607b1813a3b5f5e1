//! Background worker configuration (outbox processor, queue consumer)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Outbox processor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    /// Seconds between processor ticks
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Max events claimed per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Dispatch attempts before an event is parked as failed
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
}

impl OutboxConfig {
    /// Tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    /// Validate outbox configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 || self.batch_size > 100 {
            return Err(ValidationError::InvalidOutboxBatchSize);
        }
        Ok(())
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
        }
    }
}

/// Queue consumer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Queue name (key prefix on the broker)
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// Max messages per receive call
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,

    /// Long-poll wait in seconds
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// Per-message visibility lease in seconds
    #[serde(default = "default_visibility_secs")]
    pub visibility_secs: u64,

    /// Pause after a failed poll iteration, in seconds
    #[serde(default = "default_error_pause_secs")]
    pub error_pause_secs: u64,
}

impl QueueConfig {
    /// Long-poll wait as Duration
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    /// Visibility lease as Duration
    pub fn visibility(&self) -> Duration {
        Duration::from_secs(self.visibility_secs)
    }

    /// Error pause as Duration
    pub fn error_pause(&self) -> Duration {
        Duration::from_secs(self.error_pause_secs)
    }

    /// Validate queue configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingRequired("QUEUE_NAME"));
        }
        if self.visibility_secs <= self.wait_secs {
            return Err(ValidationError::InvalidQueueTimeouts);
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            max_messages: default_max_messages(),
            wait_secs: default_wait_secs(),
            visibility_secs: default_visibility_secs(),
            error_pause_secs: default_error_pause_secs(),
        }
    }
}

fn default_tick_secs() -> u64 {
    5
}

fn default_batch_size() -> u32 {
    10
}

fn default_max_retries() -> i32 {
    5
}

fn default_queue_name() -> String {
    "donation-events".to_string()
}

fn default_max_messages() -> u32 {
    10
}

fn default_wait_secs() -> u64 {
    20
}

fn default_visibility_secs() -> u64 {
    300
}

fn default_error_pause_secs() -> u64 {
    5
}
