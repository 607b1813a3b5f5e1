//! PayOS payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the PayOS merchant API:
//! payment-link creation/cancellation over HTTPS and HMAC-SHA256 webhook
//! verification with constant-time comparison.

mod client;
mod mock;
mod wire;

pub use client::PayOsGateway;
pub use mock::MockGateway;
pub use wire::signature_of;
