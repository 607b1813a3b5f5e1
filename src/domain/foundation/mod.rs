//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the donation processing domain.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CampaignId, DonationId, ExternalUserId, OrderCode, PaymentTransactionId, UserId, WalletId,
};
pub use money::Amount;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
