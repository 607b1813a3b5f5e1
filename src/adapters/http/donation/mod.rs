//! Donation HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{CreateDonationRequest, DonationResponse, PaymentInstructionsResponse};
pub use handlers::DonationAppState;
pub use routes::donation_router;
