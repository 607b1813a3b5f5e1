//! Outbox event handlers for confirmed payments.
//!
//! `PaymentSucceededHandler` performs the financial side effect (admin
//! wallet credit) and then a series of individually fault-isolated
//! best-effort follow-ups. Only the wallet credit can fail the event; by
//! the time the follow-ups run, the credit is already the record of truth
//! and a notification or stats hiccup must not push the event back to
//! pending.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::services::{BadgeAwardService, OutboxEventHandler, WalletLedger};
use crate::domain::donation::{
    CampaignStatus, CampaignSurplusDetected, Donation, PaymentSucceeded, EVENT_CAMPAIGN_SURPLUS,
    EVENT_PAYMENT_SUCCEEDED,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::wallet::{TransactionType, WalletKind};
use crate::ports::{
    CampaignCache, CampaignStore, DonationNotice, DonationStore, NewCredit, NewOutboxEvent,
    Notifier, OutboxEvent, OutboxStore, UpdateDonorStats, UserDirectory,
};

/// Handles `DONATION_PAYMENT_SUCCEEDED` events from the outbox.
pub struct PaymentSucceededHandler {
    ledger: Arc<WalletLedger>,
    store: Arc<dyn DonationStore>,
    campaigns: Arc<dyn CampaignStore>,
    outbox: Arc<dyn OutboxStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<dyn CampaignCache>,
    badges: Arc<BadgeAwardService>,
    admin_owner: UserId,
}

impl PaymentSucceededHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<WalletLedger>,
        store: Arc<dyn DonationStore>,
        campaigns: Arc<dyn CampaignStore>,
        outbox: Arc<dyn OutboxStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        cache: Arc<dyn CampaignCache>,
        badges: Arc<BadgeAwardService>,
        admin_owner: UserId,
    ) -> Self {
        Self {
            ledger,
            store,
            campaigns,
            outbox,
            users,
            notifier,
            cache,
            badges,
            admin_owner,
        }
    }

    /// Credit the platform wallet. This is the financial critical path: an
    /// error here fails the event so the processor retries it.
    async fn credit_admin_wallet(&self, payload: &PaymentSucceeded) -> Result<(), DomainError> {
        let donor = payload.donor_name.as_deref().unwrap_or("Anonymous");
        self.ledger
            .credit(
                self.admin_owner,
                WalletKind::Admin,
                NewCredit {
                    amount: payload.amount,
                    transaction_type: TransactionType::DonationReceived,
                    campaign_id: Some(payload.campaign_id),
                    payment_transaction_id: Some(payload.payment_transaction_id),
                    gateway: Some(payload.gateway.clone()),
                    description: Some(format!(
                        "Donation from {} - order {}",
                        donor, payload.order_code
                    )),
                    metadata: None,
                },
            )
            .await?;
        Ok(())
    }

    async fn detect_surplus(&self, donation: &Donation) {
        let campaign = match self.campaigns.find_by_id(donation.campaign_id).await {
            Ok(Some(campaign)) => campaign,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(campaign_id = %donation.campaign_id, error = %error, "Surplus check skipped");
                return;
            }
        };

        // Only an actively fundraising campaign can overshoot; completed or
        // cancelled campaigns are handled by their own settlement flow.
        if campaign.status != CampaignStatus::Active {
            return;
        }
        let Some(surplus) = campaign.surplus() else {
            return;
        };

        tracing::info!(campaign_id = %campaign.id, surplus, "Campaign exceeded its target");
        let event = CampaignSurplusDetected {
            campaign_id: campaign.id,
            surplus,
        };
        match NewOutboxEvent::new(EVENT_CAMPAIGN_SURPLUS, &event) {
            Ok(event) => {
                if let Err(error) = self.outbox.append(event).await {
                    tracing::warn!(campaign_id = %campaign.id, error = %error, "Failed to record surplus event");
                }
            }
            Err(error) => {
                tracing::warn!(campaign_id = %campaign.id, error = %error, "Failed to encode surplus event");
            }
        }
    }

    async fn send_confirmation(&self, donation: &Donation, payload: &PaymentSucceeded) {
        let notice = DonationNotice::PaymentConfirmed {
            donation_id: donation.id,
            campaign_id: donation.campaign_id,
            order_code: payload.order_code,
            amount: payload.amount,
            donor_name: payload.donor_name.clone(),
        };
        if let Err(error) = self.notifier.notify(notice).await {
            tracing::warn!(order_code = %payload.order_code, error = %error, "Confirmation notification failed");
        }
    }

    async fn update_donor(&self, donation: &Donation, payload: &PaymentSucceeded) {
        let Some(external_id) = &donation.donor_external_id else {
            return;
        };

        let profile = match self.users.get_user_by_external_id(external_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(external_id = %external_id, "Donor not found in user directory");
                return;
            }
            Err(error) => {
                tracing::warn!(external_id = %external_id, error = %error, "Donor lookup failed");
                return;
            }
        };

        let totals = match self
            .users
            .update_donor_stats(UpdateDonorStats {
                donor_id: profile.id,
                amount_to_add: payload.amount,
                increment_count: 1,
                last_donation_at: Timestamp::now(),
            })
            .await
        {
            Ok(totals) => totals,
            Err(error) => {
                tracing::warn!(donor_id = %profile.id, error = %error, "Donor stats update failed");
                return;
            }
        };

        self.badges.check_and_award(&profile, totals).await;
    }
}

#[async_trait]
impl OutboxEventHandler for PaymentSucceededHandler {
    fn event_type(&self) -> &'static str {
        EVENT_PAYMENT_SUCCEEDED
    }

    async fn handle(&self, event: &OutboxEvent) -> Result<(), DomainError> {
        let payload: PaymentSucceeded =
            serde_json::from_value(event.payload.clone()).map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Malformed payment-succeeded payload: {}", e),
                )
            })?;

        // Financial critical path.
        self.credit_admin_wallet(&payload).await?;

        let order_code = payload.order_code;
        let donation = match self.store.find_donation_by_order_code(order_code).await? {
            Some(donation) => donation,
            None => {
                tracing::warn!(order_code = %order_code, "Donation not found; skipping side effects");
                return Ok(());
            }
        };

        // Best-effort follow-ups, each isolated from the others.
        self.detect_surplus(&donation).await;
        self.send_confirmation(&donation, &payload).await;
        self.update_donor(&donation, &payload).await;

        if let Err(error) = self.cache.invalidate(donation.campaign_id).await {
            tracing::warn!(campaign_id = %donation.campaign_id, error = %error, "Campaign cache invalidation failed");
        }

        Ok(())
    }
}

/// Handles `CAMPAIGN_SURPLUS_DETECTED` events: forwards the fact to the
/// notification pipeline for operator follow-up.
pub struct CampaignSurplusHandler {
    notifier: Arc<dyn Notifier>,
}

impl CampaignSurplusHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl OutboxEventHandler for CampaignSurplusHandler {
    fn event_type(&self) -> &'static str {
        EVENT_CAMPAIGN_SURPLUS
    }

    async fn handle(&self, event: &OutboxEvent) -> Result<(), DomainError> {
        let payload: CampaignSurplusDetected = serde_json::from_value(event.payload.clone())
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Malformed surplus payload: {}", e),
                )
            })?;

        self.notifier
            .notify(DonationNotice::CampaignSurplus {
                campaign_id: payload.campaign_id,
                surplus: payload.surplus,
            })
            .await
    }
}
