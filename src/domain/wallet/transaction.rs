//! Append-only ledger entries and the credit idempotency key.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::foundation::{CampaignId, PaymentTransactionId, Timestamp, WalletId};

/// Why a ledger entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// A confirmed donation credited to the platform wallet.
    DonationReceived,
    /// Manual correction by an operator.
    Adjustment,
}

impl TransactionType {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::DonationReceived => "donation_received",
            TransactionType::Adjustment => "adjustment",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "donation_received" => Some(TransactionType::DonationReceived),
            "adjustment" => Some(TransactionType::Adjustment),
            _ => None,
        }
    }
}

/// The tuple that makes a credit attempt unique.
///
/// Two deliveries of the same confirmation (overlapping webhooks, outbox
/// retries) produce the same key, so the second insert is detected and
/// skipped instead of crediting twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreditKey {
    pub wallet_id: WalletId,
    pub payment_transaction_id: PaymentTransactionId,
    pub gateway: String,
    pub amount: i64,
}

/// One immutable ledger line. Never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: WalletId,
    pub campaign_id: Option<CampaignId>,
    pub payment_transaction_id: Option<PaymentTransactionId>,
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub gateway: Option<String>,
    pub description: Option<String>,
    /// Free-form provenance (gateway payload excerpts, operator notes).
    pub metadata: Option<JsonValue>,
    pub created_at: Timestamp,
}

impl WalletTransaction {
    /// The idempotency key of this entry, when it has one.
    ///
    /// Entries without a payment reference and gateway (manual adjustments)
    /// are not deduplicated.
    pub fn credit_key(&self) -> Option<CreditKey> {
        match (&self.payment_transaction_id, &self.gateway) {
            (Some(payment_transaction_id), Some(gateway)) => Some(CreditKey {
                wallet_id: self.wallet_id,
                payment_transaction_id: *payment_transaction_id,
                gateway: gateway.clone(),
                amount: self.amount,
            }),
            _ => None,
        }
    }
}
