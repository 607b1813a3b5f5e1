//! Notifier port - best-effort donor and operator notifications.
//!
//! Notification content and delivery (email templates, push, in-app) belong
//! to the notification service. Every call through this port sits on a
//! best-effort path: failures are logged by the caller and never reach the
//! financial flow.

use async_trait::async_trait;

use crate::domain::foundation::{CampaignId, DomainError, DonationId, OrderCode};

/// Facts a notification is built from. Rendering happens downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum DonationNotice {
    /// Payment link issued; donor still needs to pay.
    PaymentPending {
        donation_id: DonationId,
        campaign_id: CampaignId,
        order_code: OrderCode,
        amount: i64,
        checkout_url: Option<String>,
        donor_name: Option<String>,
    },
    /// Transfer confirmed and validated.
    PaymentConfirmed {
        donation_id: DonationId,
        campaign_id: CampaignId,
        order_code: OrderCode,
        amount: i64,
        donor_name: Option<String>,
    },
    /// A campaign passed its fundraising target.
    CampaignSurplus {
        campaign_id: CampaignId,
        surplus: i64,
    },
}

/// Port for the notification collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand a notice to the notification pipeline.
    async fn notify(&self, notice: DonationNotice) -> Result<(), DomainError>;
}
