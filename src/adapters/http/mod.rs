//! HTTP adapters - REST API implementations.
//!
//! The donation module owns the donor-facing endpoints and the gateway
//! webhook; `error` maps application errors onto HTTP responses.

pub mod donation;
mod error;

pub use donation::{donation_router, DonationAppState};
pub use error::ApiError;
