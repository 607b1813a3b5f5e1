//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `GIVEBRIDGE` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use givebridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod badges;
mod database;
mod error;
mod payment;
mod redis;
mod server;
mod users;
mod wallet;
mod workers;

pub use badges::{BadgeConfig, MilestoneEntry};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use self::redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use users::UsersConfig;
pub use wallet::WalletConfig;
pub use workers::{OutboxConfig, QueueConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (queue transport, cache invalidation)
    pub redis: RedisConfig,

    /// Payment gateway configuration (PayOS)
    pub payment: PaymentConfig,

    /// Outbox processor configuration
    #[serde(default)]
    pub outbox: OutboxConfig,

    /// Queue consumer configuration
    #[serde(default)]
    pub queue: QueueConfig,

    /// Badge milestone table
    #[serde(default)]
    pub badges: BadgeConfig,

    /// Platform wallet settings
    pub wallet: WalletConfig,

    /// User service RPC endpoint
    pub users: UsersConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `GIVEBRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GIVEBRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `GIVEBRIDGE__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GIVEBRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.payment.validate()?;
        self.outbox.validate()?;
        self.queue.validate()?;
        self.badges.validate()?;
        self.wallet.validate()?;
        self.users.validate()?;
        Ok(())
    }
}
