//! Givebridge - donation processing backend.
//!
//! Coordinates donation creation against an external payment gateway,
//! persists the result durably, and reconciles asynchronous confirmations
//! through a transactional outbox, a lease-based queue consumer, and an
//! idempotent wallet ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
