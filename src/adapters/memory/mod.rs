//! In-memory adapters for tests and local development.
//!
//! One shared [`InMemoryStore`] implements the persistence ports over a
//! single mutex-guarded state so multi-row transactional semantics
//! (donation + payment insert, payment transition + stats + outbox append,
//! credit + balance increment) hold exactly as in PostgreSQL.

mod store;

pub use store::{InMemoryCache, InMemoryStore, InMemoryUserDirectory, RecordingNotifier};
