//! Payment gateway port.
//!
//! Defines the contract for the external payment provider that issues
//! QR/checkout payment links and confirms bank transfers via webhook.
//!
//! # Design
//!
//! - The gateway is remote and opaque; only these named operations exist.
//! - Opening a link happens *before* any local write, cancelling happens as
//!   the saga's compensating action, so neither call ever runs inside a
//!   database transaction.
//! - Webhook signature verification belongs here because the secret and the
//!   canonicalization scheme are gateway properties.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Amount, OrderCode};

/// Port for the remote payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment link for one donation attempt.
    ///
    /// Nothing durable exists locally at this point; a failure here is
    /// surfaced to the caller without compensation.
    async fn create_payment_link(
        &self,
        request: CreatePaymentLink,
    ) -> Result<PaymentLink, GatewayError>;

    /// Cancel a previously opened payment link.
    ///
    /// Used as the saga's compensating action when local persistence fails
    /// after the link was opened.
    async fn cancel_payment_link(
        &self,
        order_code: OrderCode,
        reason: &str,
    ) -> Result<(), GatewayError>;

    /// Verify the signature of a webhook payload.
    ///
    /// Returns `Ok(())` only when the signature matches the payload data.
    /// No state is read or written here.
    async fn verify_webhook(&self, payload: &WebhookPayload) -> Result<(), GatewayError>;
}

/// Request to open a payment link.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaymentLink {
    /// Correlation key, unique per attempt.
    pub order_code: OrderCode,
    pub amount: Amount,
    /// Bank transfer description (already truncated to the gateway limit).
    pub description: String,
}

/// Artifacts returned when a payment link is opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub payment_link_id: Option<String>,
    pub checkout_url: Option<String>,
    /// VietQR payload string for in-app QR rendering.
    pub qr_code: Option<String>,
    /// Manual transfer details.
    pub bank_id: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
}

/// Webhook body delivered by the gateway.
///
/// `code == "00"` denotes gateway-reported success; any other value denotes
/// failure. The signature covers the `data` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub data: WebhookData,
    pub signature: String,
}

/// Transfer result fields inside a webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    pub order_code: i64,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub amount: i64,
    #[serde(default)]
    pub counterparty_account_name: Option<String>,
    #[serde(default)]
    pub counterparty_account_number: Option<String>,
    #[serde(default)]
    pub counterparty_bank_name: Option<String>,
    #[serde(default)]
    pub counterparty_bank_id: Option<String>,
    #[serde(default)]
    pub transaction_date_time: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl WebhookData {
    /// True when the gateway itself reports the transfer as successful.
    /// Local amount/description validation still applies on top.
    pub fn gateway_reports_success(&self) -> bool {
        self.code == "00"
    }
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Could not reach the gateway or it answered with a transport error.
    #[error("gateway unreachable: {0}")]
    Network(String),

    /// The gateway answered but refused the operation.
    #[error("gateway rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Webhook signature did not match the payload.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// The gateway response could not be understood.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// True for failures where a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety check
    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn success_code_is_exactly_double_zero() {
        let mut data = sample_data();
        assert!(data.gateway_reports_success());

        data.code = "01".to_string();
        assert!(!data.gateway_reports_success());

        data.code = "0".to_string();
        assert!(!data.gateway_reports_success());
    }

    #[test]
    fn webhook_data_parses_camel_case_wire_format() {
        let json = r#"{
            "orderCode": 1700000000000,
            "code": "00",
            "description": "DONATE 0190b5c4 Warm Meals",
            "amount": 50000,
            "counterpartyAccountName": "NGUYEN VAN A",
            "counterpartyAccountNumber": "00123456789",
            "counterpartyBankName": "VCB",
            "counterpartyBankId": "970436",
            "transactionDateTime": "2026-01-05 10:22:41",
            "reference": "FT26005123456"
        }"#;

        let data: WebhookData = serde_json::from_str(json).unwrap();
        assert_eq!(data.order_code, 1700000000000);
        assert_eq!(data.amount, 50000);
        assert_eq!(data.counterparty_bank_id.as_deref(), Some("970436"));
    }

    #[test]
    fn webhook_data_tolerates_missing_optional_fields() {
        let json = r#"{"orderCode": 1, "code": "01", "amount": 1000}"#;
        let data: WebhookData = serde_json::from_str(json).unwrap();
        assert_eq!(data.description, "");
        assert!(data.counterparty_account_name.is_none());
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(GatewayError::Network("timeout".into()).is_retryable());
        assert!(!GatewayError::InvalidSignature.is_retryable());
        assert!(!GatewayError::Rejected {
            code: "429".into(),
            message: "slow down".into()
        }
        .is_retryable());
    }

    fn sample_data() -> WebhookData {
        WebhookData {
            order_code: 1700000000000,
            code: "00".to_string(),
            description: "DONATE 0190b5c4 Warm Meals".to_string(),
            amount: 50_000,
            counterparty_account_name: None,
            counterparty_account_number: None,
            counterparty_bank_name: None,
            counterparty_bank_id: None,
            transaction_date_time: None,
            reference: None,
        }
    }
}
