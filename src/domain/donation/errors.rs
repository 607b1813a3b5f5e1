//! Donation flow error taxonomy.
//!
//! Each variant is a branch the orchestrator handles explicitly; callers
//! never have to match on error message shapes.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Outcome categories for the donor-facing donation flow.
#[derive(Debug, Clone, Error)]
pub enum DonationError {
    /// Request rejected before any side effect; user-correctable.
    #[error("{0}")]
    Validation(String),

    /// Target campaign does not exist.
    #[error("Campaign not found")]
    CampaignNotFound,

    /// The payment gateway could not open a payment link; retryable.
    #[error("Failed to create payment link. Please try again later.")]
    GatewayUnavailable,

    /// Local persistence failed after the gateway call; retryable. The
    /// compensating cancellation has already been attempted by the time this
    /// surfaces.
    #[error("Failed to create donation request. Please try again.")]
    Persistence,

    /// Requested record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Unexpected infrastructure failure.
    #[error("{0}")]
    Internal(DomainError),
}

impl DonationError {
    /// True for failures the caller may safely retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DonationError::GatewayUnavailable | DonationError::Persistence
        )
    }
}

impl From<DomainError> for DonationError {
    fn from(err: DomainError) -> Self {
        DonationError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(DonationError::GatewayUnavailable.is_retryable());
        assert!(DonationError::Persistence.is_retryable());
        assert!(!DonationError::Validation("bad amount".into()).is_retryable());
        assert!(!DonationError::CampaignNotFound.is_retryable());
    }

    #[test]
    fn user_facing_messages_do_not_leak_internals() {
        let msg = DonationError::GatewayUnavailable.to_string();
        assert!(!msg.contains("http"));
        assert!(msg.contains("try again"));
    }
}
