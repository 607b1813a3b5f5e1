//! Application handlers.
//!
//! Command handlers for the synchronous paths (donation saga, webhook
//! reconciliation) and event handlers driven by the async infrastructure
//! (outbox processor, queue consumer).

mod create_donation;
mod handle_payment_webhook;
mod payment_succeeded;
mod pending_donation;

pub use create_donation::{
    Actor, CreateDonationCommand, CreateDonationHandler, PaymentInstructions,
};
pub use handle_payment_webhook::{HandlePaymentWebhookHandler, WebhookError, WebhookOutcome};
pub use payment_succeeded::{CampaignSurplusHandler, PaymentSucceededHandler};
pub use pending_donation::PendingDonationHandler;
