//! WalletStore port - wallets and the append-only ledger.
//!
//! The duplicate-credit guard is a check-then-insert against the credit key
//! `(wallet, payment transaction, gateway, amount)`, backed by a partial
//! unique index so a lost race still cannot double-credit.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::domain::foundation::{CampaignId, DomainError, PaymentTransactionId, UserId, WalletId};
use crate::domain::wallet::{CreditKey, TransactionType, Wallet, WalletTransaction};

/// Outcome of a guarded insert.
///
/// Shared idempotency vocabulary: `Duplicate` means the row (or an
/// equivalent one) already existed and nothing was changed.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The entry was inserted and the balance incremented.
    Inserted(WalletTransaction),
    /// An entry with the same credit key already existed; returned as-is.
    Duplicate(WalletTransaction),
}

impl InsertOutcome {
    /// The ledger entry, whether fresh or pre-existing.
    pub fn into_transaction(self) -> WalletTransaction {
        match self {
            InsertOutcome::Inserted(tx) | InsertOutcome::Duplicate(tx) => tx,
        }
    }

    /// True when this call actually moved money.
    pub fn was_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// A credit to apply to a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCredit {
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub campaign_id: Option<CampaignId>,
    pub payment_transaction_id: Option<PaymentTransactionId>,
    pub gateway: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<JsonValue>,
}

/// Port for wallet persistence.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Find a wallet by owner and kind.
    async fn find_wallet(
        &self,
        owner_id: UserId,
        kind: crate::domain::wallet::WalletKind,
    ) -> Result<Option<Wallet>, DomainError>;

    /// Find an existing ledger entry by credit key.
    async fn find_entry_by_credit_key(
        &self,
        key: &CreditKey,
    ) -> Result<Option<WalletTransaction>, DomainError>;

    /// Insert a ledger entry and increment the wallet balance by exactly the
    /// entry amount, in one transaction.
    ///
    /// Implementations map a unique-index conflict on the credit key to
    /// `InsertOutcome::Duplicate` with the existing row, so concurrent
    /// deliveries of the same confirmation converge on one entry.
    async fn insert_credit(
        &self,
        wallet_id: WalletId,
        credit: NewCredit,
    ) -> Result<InsertOutcome, DomainError>;
}
