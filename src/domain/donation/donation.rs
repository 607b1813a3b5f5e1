//! Donation entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, CampaignId, DonationId, ExternalUserId, Timestamp};

/// Maximum length of the bank transfer description accepted by the gateway.
const TRANSFER_DESCRIPTION_MAX: usize = 25;

/// A donation made to a campaign.
///
/// Immutable once created; its settlement state lives on the associated
/// payment transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    /// Identity-provider reference of the donor; `None` for anonymous guests.
    pub donor_external_id: Option<ExternalUserId>,
    pub campaign_id: CampaignId,
    pub amount: Amount,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Donation {
    /// Creates a new donation with a freshly issued time-ordered id.
    ///
    /// A donation with no donor reference is always anonymous, regardless of
    /// the requested flag.
    pub fn new(
        campaign_id: CampaignId,
        amount: Amount,
        donor_external_id: Option<ExternalUserId>,
        message: Option<String>,
        is_anonymous: bool,
        now: Timestamp,
    ) -> Self {
        let is_anonymous = donor_external_id.is_none() || is_anonymous;
        Self {
            id: DonationId::new(),
            donor_external_id,
            campaign_id,
            amount,
            message,
            is_anonymous,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable description placed on the bank transfer.
    ///
    /// Gateways cap this field, so the campaign title is truncated and the
    /// whole string clamped to the gateway limit.
    pub fn transfer_description(&self, campaign_title: &str) -> String {
        let title: String = campaign_title.chars().take(15).collect();
        let description = format!("DONATE {} {}", self.id.short(), title.trim_end());
        description.chars().take(TRANSFER_DESCRIPTION_MAX).collect()
    }
}
