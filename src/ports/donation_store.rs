//! DonationStore port - atomic persistence for the donation aggregate.
//!
//! The donation and its payment transaction are written together in one
//! local transaction, and the terminal payment transition is applied
//! together with the campaign stats increment and the outbox append. Remote
//! calls never run inside these transactions.

use async_trait::async_trait;

use crate::domain::donation::{CounterpartyAccount, Donation, PaymentTransaction};
use crate::domain::foundation::{DomainError, DonationId, OrderCode};

use super::outbox_store::NewOutboxEvent;

/// How a pending payment resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentResolution {
    /// Transfer confirmed and validated; campaign stats are incremented and
    /// the success event is appended to the outbox in the same transaction.
    Succeeded {
        counterparty: CounterpartyAccount,
        outbox_event: NewOutboxEvent,
    },
    /// Transfer failed, or a gateway-reported success failed local
    /// validation.
    Failed {
        error_code: String,
        error_description: String,
        counterparty: Option<CounterpartyAccount>,
    },
}

/// Result of a guarded terminal transition.
///
/// `AlreadyTerminal` is the idempotency signal: a duplicate webhook delivery
/// finds the row already settled and must not re-apply side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    AlreadyTerminal,
}

/// Port for donation aggregate persistence.
#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Insert the donation and its pending payment transaction atomically.
    ///
    /// A failure here leaves no partial state; the saga then compensates the
    /// already-opened gateway link.
    async fn insert_pending(
        &self,
        donation: &Donation,
        payment: &PaymentTransaction,
    ) -> Result<(), DomainError>;

    /// Find a payment transaction by its gateway order code.
    async fn find_payment_by_order_code(
        &self,
        order_code: OrderCode,
    ) -> Result<Option<PaymentTransaction>, DomainError>;

    /// Find a donation by id.
    async fn find_donation(&self, id: DonationId) -> Result<Option<Donation>, DomainError>;

    /// Find the donation behind an order code.
    async fn find_donation_by_order_code(
        &self,
        order_code: OrderCode,
    ) -> Result<Option<Donation>, DomainError>;

    /// Apply exactly one terminal transition to a pending payment.
    ///
    /// Runs as a single transaction: the status update, the counterparty
    /// metadata, and - on success - the campaign received-amount increment
    /// plus the outbox append. Returns `AlreadyTerminal` without touching
    /// anything when the row is no longer pending.
    async fn resolve_payment(
        &self,
        order_code: OrderCode,
        resolution: PaymentResolution,
    ) -> Result<TransitionOutcome, DomainError>;
}
