//! Event payloads exchanged through the outbox and the message queue.
//!
//! Field names are camelCase on the wire so every consumer of the channel
//! (this service or others) sees one convention.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CampaignId, DonationId, OrderCode, PaymentTransactionId,
};

/// Gateway tag recorded on ledger entries and event payloads.
pub const GATEWAY_TAG: &str = "PAYOS";

/// Outbox event type: a payment was confirmed and validated.
pub const EVENT_PAYMENT_SUCCEEDED: &str = "DONATION_PAYMENT_SUCCEEDED";

/// Outbox event type: a campaign exceeded its fundraising target.
pub const EVENT_CAMPAIGN_SURPLUS: &str = "CAMPAIGN_SURPLUS_DETECTED";

/// Payload of [`EVENT_PAYMENT_SUCCEEDED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSucceeded {
    pub order_code: OrderCode,
    pub amount: i64,
    pub payment_transaction_id: PaymentTransactionId,
    pub donation_id: DonationId,
    pub campaign_id: CampaignId,
    pub donor_external_id: Option<String>,
    pub donor_name: Option<String>,
    pub gateway: String,
}

/// Payload of [`EVENT_CAMPAIGN_SURPLUS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSurplusDetected {
    pub campaign_id: CampaignId,
    pub surplus: i64,
}

/// Messages this service understands on the shared donation queue.
///
/// The queue channel is shared with other consumers: unknown `eventType`
/// values are not an error here, the message simply belongs to someone else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum QueueEvent {
    /// A donation was created and awaits payment.
    #[serde(rename = "DONATION_PENDING", rename_all = "camelCase")]
    DonationPending {
        donation_id: DonationId,
        campaign_id: CampaignId,
        amount: i64,
        order_code: OrderCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        donor_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checkout_url: Option<String>,
    },
}

impl QueueEvent {
    /// The discriminator this variant carries on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::DonationPending { .. } => "DONATION_PENDING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_succeeded_uses_camel_case_wire_names() {
        let payload = PaymentSucceeded {
            order_code: OrderCode::from_i64(1700000000000),
            amount: 50_000,
            payment_transaction_id: PaymentTransactionId::new(),
            donation_id: DonationId::new(),
            campaign_id: CampaignId::new(),
            donor_external_id: Some("donor-1".to_string()),
            donor_name: Some("An Nguyen".to_string()),
            gateway: GATEWAY_TAG.to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("orderCode").is_some());
        assert!(json.get("paymentTransactionId").is_some());
        assert!(json.get("donorExternalId").is_some());
    }

    #[test]
    fn queue_event_roundtrips_with_discriminator() {
        let event = QueueEvent::DonationPending {
            donation_id: DonationId::new(),
            campaign_id: CampaignId::new(),
            amount: 50_000,
            order_code: OrderCode::from_i64(1700000000000),
            donor_name: None,
            checkout_url: Some("https://pay.example/x".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"eventType\":\"DONATION_PENDING\""));

        let back: QueueEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn queue_event_rejects_missing_required_fields() {
        let json = r#"{"eventType":"DONATION_PENDING","campaignId":"0e2e7c61-6f3b-4c2e-8f49-111111111111"}"#;
        let result: Result<QueueEvent, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
