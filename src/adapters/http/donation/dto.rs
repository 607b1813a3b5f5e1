//! Request/response DTOs for the donation endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::PaymentInstructions;
use crate::domain::donation::Donation;

/// Body of `POST /donations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub campaign_id: Uuid,
    /// Amount in minor currency units.
    pub amount: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Body returned by `POST /donations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructionsResponse {
    pub message: String,
    pub donation_id: Uuid,
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

impl PaymentInstructionsResponse {
    /// Wraps instructions with the donor-facing acknowledgment line.
    pub fn from_instructions(instructions: PaymentInstructions, donor_name: Option<&str>) -> Self {
        let message = match donor_name {
            Some(name) => format!(
                "Thank you {}! Please complete payment by scanning the QR code or transferring manually with the bank details below.",
                name
            ),
            None => "Thank you for your donation! Please complete payment by scanning the QR code or transferring manually with the bank details below.".to_string(),
        };
        Self {
            message,
            donation_id: *instructions.donation_id.as_uuid(),
            order_code: instructions.order_code.value(),
            amount: instructions.amount,
            description: instructions.description,
            checkout_url: instructions.checkout_url,
            qr_code: instructions.qr_code,
            payment_link_id: instructions.payment_link_id,
            bank_id: instructions.bank_id,
            account_number: instructions.account_number,
            account_name: instructions.account_name,
        }
    }
}

/// Body returned by `GET /donations/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_external_id: Option<String>,
    pub campaign_id: Uuid,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub created_at: String,
}

impl From<Donation> for DonationResponse {
    fn from(donation: Donation) -> Self {
        // Anonymous donations never expose the donor reference.
        let donor_external_id = if donation.is_anonymous {
            None
        } else {
            donation
                .donor_external_id
                .as_ref()
                .map(|d| d.as_str().to_string())
        };
        Self {
            id: *donation.id.as_uuid(),
            donor_external_id,
            campaign_id: *donation.campaign_id.as_uuid(),
            amount: donation.amount.value(),
            message: donation.message,
            is_anonymous: donation.is_anonymous,
            created_at: donation.created_at.as_datetime().to_rfc3339(),
        }
    }
}
