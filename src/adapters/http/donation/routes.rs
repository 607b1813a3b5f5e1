//! Route table for the donation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, DonationAppState};

/// Builds the donation router.
pub fn donation_router(state: DonationAppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/donations", post(handlers::create_donation))
        .route("/donations/:id", get(handlers::get_donation))
        .route("/webhooks/payment", post(handlers::payment_webhook))
        .with_state(state)
}
