//! Payment transaction lifecycle.
//!
//! One payment transaction per donation. Status only ever moves
//! `Pending -> Success` or `Pending -> Failed`; terminal states are never
//! re-transitioned, which is the idempotency guard for repeated webhook
//! deliveries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Amount, DonationId, OrderCode, PaymentTransactionId, StateMachine, Timestamp, ValidationError,
};

/// Settlement status of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment link issued, waiting for the gateway to confirm the transfer.
    Pending,

    /// Transfer confirmed and validated. Terminal.
    Success,

    /// Transfer failed, or a gateway-reported success failed local
    /// validation. Terminal.
    Failed,
}

impl PaymentStatus {
    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown status value: {}", other),
            )),
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!((self, target), (Pending, Success) | (Pending, Failed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Success, Failed],
            Success | Failed => vec![],
        }
    }
}

/// Bank counterparty details reported by the gateway once a transfer settles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyAccount {
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_id: Option<String>,
    pub transaction_date_time: Option<String>,
    pub reference: Option<String>,
}

/// The gateway-facing half of a donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: PaymentTransactionId,
    pub donation_id: DonationId,
    pub order_code: OrderCode,
    pub amount: Amount,
    pub payment_link_id: Option<String>,
    pub checkout_url: Option<String>,
    pub qr_code: Option<String>,
    pub status: PaymentStatus,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
    pub counterparty: Option<CounterpartyAccount>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentTransaction {
    /// Creates a pending transaction for a donation, carrying the artifacts
    /// the gateway returned when the payment link was opened.
    pub fn new_pending(
        donation_id: DonationId,
        order_code: OrderCode,
        amount: Amount,
        payment_link_id: Option<String>,
        checkout_url: Option<String>,
        qr_code: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentTransactionId::new(),
            donation_id,
            order_code,
            amount,
            payment_link_id,
            checkout_url,
            qr_code,
            status: PaymentStatus::Pending,
            error_code: None,
            error_description: None,
            counterparty: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the transfer as confirmed.
    pub fn succeed(
        &mut self,
        counterparty: CounterpartyAccount,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PaymentStatus::Success)?;
        self.counterparty = Some(counterparty);
        self.error_code = None;
        self.error_description = None;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the transfer as failed with a machine-readable reason.
    pub fn fail(
        &mut self,
        error_code: impl Into<String>,
        error_description: impl Into<String>,
        counterparty: Option<CounterpartyAccount>,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PaymentStatus::Failed)?;
        self.error_code = Some(error_code.into());
        self.error_description = Some(error_description.into());
        self.counterparty = counterparty;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PaymentTransaction {
        PaymentTransaction::new_pending(
            DonationId::new(),
            OrderCode::from_i64(1700000000000),
            Amount::new(50_000).unwrap(),
            Some("plink_1".to_string()),
            Some("https://pay.example/plink_1".to_string()),
            Some("00020101021238".to_string()),
            Timestamp::now(),
        )
    }

    #[test]
    fn new_transaction_starts_pending() {
        let tx = pending();
        assert_eq!(tx.status, PaymentStatus::Pending);
        assert!(tx.counterparty.is_none());
    }

    #[test]
    fn pending_can_succeed_once() {
        let mut tx = pending();
        tx.succeed(CounterpartyAccount::default(), Timestamp::now())
            .unwrap();
        assert_eq!(tx.status, PaymentStatus::Success);

        let second = tx.succeed(CounterpartyAccount::default(), Timestamp::now());
        assert!(second.is_err());
    }

    #[test]
    fn pending_can_fail_once() {
        let mut tx = pending();
        tx.fail("01", "declined by bank", None, Timestamp::now())
            .unwrap();
        assert_eq!(tx.status, PaymentStatus::Failed);
        assert_eq!(tx.error_code.as_deref(), Some("01"));

        let second = tx.fail("01", "declined again", None, Timestamp::now());
        assert!(second.is_err());
    }

    #[test]
    fn failed_cannot_become_success() {
        let mut tx = pending();
        tx.fail("01", "declined", None, Timestamp::now()).unwrap();

        let result = tx.succeed(CounterpartyAccount::default(), Timestamp::now());
        assert!(result.is_err());
        assert_eq!(tx.status, PaymentStatus::Failed);
    }

    #[test]
    fn success_records_counterparty() {
        let mut tx = pending();
        let counterparty = CounterpartyAccount {
            account_name: Some("NGUYEN VAN A".to_string()),
            account_number: Some("00123456789".to_string()),
            bank_name: Some("VCB".to_string()),
            ..Default::default()
        };
        tx.succeed(counterparty.clone(), Timestamp::now()).unwrap();
        assert_eq!(tx.counterparty, Some(counterparty));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(PaymentStatus::Success.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }

    #[test]
    fn status_roundtrips_through_storage_form() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Success,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(PaymentStatus::parse("refunded").is_err());
    }
}
