//! Application layer - command handlers and background services.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers own the synchronous request paths (donation saga, webhook
//! reconciliation); services own the long-running async paths (outbox
//! processor, queue consumer) and shared coordination (ledger, badges).

pub mod handlers;
pub mod retry;
pub mod services;

pub use handlers::{
    Actor, CreateDonationCommand, CreateDonationHandler, PaymentInstructions,
    HandlePaymentWebhookHandler, WebhookError, WebhookOutcome,
    PaymentSucceededHandler, CampaignSurplusHandler, PendingDonationHandler,
};
pub use retry::{Backoff, RecordingSleeper, Sleeper, TokioSleeper};
pub use services::{
    BadgeAwardService, OutboxDispatcher, OutboxEventHandler, OutboxProcessor, QueueConsumer,
    WalletLedger,
};
