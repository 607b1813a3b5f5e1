//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `payos` - Payment gateway client (HTTP) and a scriptable mock
//! - `postgres` - PostgreSQL stores (donations, wallets, outbox, campaigns)
//! - `queue` - Message queue transports (Redis, in-memory)
//! - `memory` - In-memory stores for tests and local development
//! - `users` - User service RPC client
//! - `http` - Inbound HTTP surface (axum)

pub mod http;
pub mod memory;
pub mod payos;
pub mod postgres;
pub mod queue;
pub mod users;

pub use memory::{InMemoryCache, InMemoryStore, InMemoryUserDirectory, RecordingNotifier};
pub use payos::{MockGateway, PayOsGateway};
pub use queue::{InMemoryQueue, RedisQueue};
