//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Outbox batch size must be between 1 and 100")]
    InvalidOutboxBatchSize,

    #[error("Queue visibility timeout must exceed the long-poll wait")]
    InvalidQueueTimeouts,

    #[error("Badge milestone table cannot be empty")]
    EmptyMilestones,

    #[error("Invalid admin wallet owner id")]
    InvalidAdminOwner,

    #[error("Invalid user service base URL")]
    InvalidUsersUrl,
}
