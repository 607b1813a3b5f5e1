//! CreateDonationHandler - the donation creation saga.
//!
//! Coordinates a remote payment-link creation with local persistence:
//!
//! 1. Validate the campaign phase and the amount (pure rejection, no side
//!    effects).
//! 2. Generate the donation id and a per-attempt order code.
//! 3. Open the payment link at the gateway. Nothing durable exists locally
//!    yet, so a failure here needs no compensation.
//! 4. Insert the donation and its pending payment transaction in one local
//!    transaction.
//! 5. If step 4 fails, cancel the remote link with bounded backoff; when
//!    retries run out, emit an operator-visible record and still fail the
//!    request.
//! 6. Enqueue a best-effort pending-donation notice; the payment row is the
//!    source of truth, so an enqueue failure only costs a notification.
//! 7. Return payment instructions immediately; confirmation arrives later
//!    through the webhook.

use std::sync::Arc;
use std::time::Duration;

use crate::application::retry::{self, Backoff, Sleeper};
use crate::domain::donation::{
    CampaignPhase, Donation, DonationError, PaymentTransaction, QueueEvent,
};
use crate::domain::foundation::{Amount, CampaignId, DonationId, ExternalUserId, OrderCode, Timestamp};
use crate::ports::{
    CampaignStore, CreatePaymentLink, DonationStore, MessageQueue, PaymentGateway,
};

/// Cancellation attempts after a failed local insert.
const CANCEL_ATTEMPTS: u32 = 3;

/// Base backoff before the first cancellation attempt; doubles per attempt.
const CANCEL_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Authenticated caller identity, as verified upstream.
#[derive(Debug, Clone)]
pub struct Actor {
    pub external_id: ExternalUserId,
    pub display_name: Option<String>,
}

/// Command to create a donation.
#[derive(Debug, Clone)]
pub struct CreateDonationCommand {
    pub campaign_id: CampaignId,
    /// Amount in minor currency units.
    pub amount: i64,
    pub message: Option<String>,
    pub is_anonymous: bool,
}

/// Everything the donor needs to complete the transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInstructions {
    pub donation_id: DonationId,
    pub order_code: OrderCode,
    pub amount: i64,
    pub description: String,
    pub checkout_url: Option<String>,
    pub qr_code: Option<String>,
    pub payment_link_id: Option<String>,
    pub bank_id: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
}

/// Handler for the donation creation saga.
pub struct CreateDonationHandler {
    campaigns: Arc<dyn CampaignStore>,
    store: Arc<dyn DonationStore>,
    gateway: Arc<dyn PaymentGateway>,
    queue: Arc<dyn MessageQueue>,
    sleeper: Arc<dyn Sleeper>,
}

impl CreateDonationHandler {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        store: Arc<dyn DonationStore>,
        gateway: Arc<dyn PaymentGateway>,
        queue: Arc<dyn MessageQueue>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            campaigns,
            store,
            gateway,
            queue,
            sleeper,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateDonationCommand,
        actor: Option<Actor>,
    ) -> Result<PaymentInstructions, DonationError> {
        let now = Timestamp::now();

        // 1. Pure validation: campaign phase and amount.
        let campaign = self
            .campaigns
            .find_by_id(cmd.campaign_id)
            .await?
            .ok_or(DonationError::CampaignNotFound)?;

        match campaign.phase(now) {
            CampaignPhase::Open => {}
            CampaignPhase::Upcoming => {
                return Err(DonationError::Validation(
                    "Fundraising has not started yet".to_string(),
                ))
            }
            CampaignPhase::Ended => {
                return Err(DonationError::Validation(
                    "Fundraising period has ended".to_string(),
                ))
            }
            CampaignPhase::Closed => {
                return Err(DonationError::Validation(
                    "Campaign is not active".to_string(),
                ))
            }
        }

        let amount = Amount::new(cmd.amount)
            .map_err(|_| DonationError::Validation("Donation amount must be greater than 0".to_string()))?;

        // 2. Identity and correlation key for this attempt.
        let donor_name = actor.as_ref().and_then(|a| a.display_name.clone());
        let donation = Donation::new(
            cmd.campaign_id,
            amount,
            actor.map(|a| a.external_id),
            cmd.message,
            cmd.is_anonymous,
            now,
        );
        let order_code = OrderCode::issue(now);
        let description = donation.transfer_description(&campaign.title);

        // 3. Open the remote payment link before any local write.
        let link = match self
            .gateway
            .create_payment_link(CreatePaymentLink {
                order_code,
                amount,
                description: description.clone(),
            })
            .await
        {
            Ok(link) => link,
            Err(error) => {
                tracing::warn!(
                    order_code = %order_code,
                    campaign_id = %cmd.campaign_id,
                    error = %error,
                    "Gateway refused to open payment link"
                );
                return Err(DonationError::GatewayUnavailable);
            }
        };

        // 4. Donation + payment transaction in one local transaction.
        let payment = PaymentTransaction::new_pending(
            donation.id,
            order_code,
            amount,
            link.payment_link_id.clone(),
            link.checkout_url.clone(),
            link.qr_code.clone(),
            now,
        );

        if let Err(error) = self.store.insert_pending(&donation, &payment).await {
            tracing::error!(
                donation_id = %donation.id,
                order_code = %order_code,
                error = %error,
                "Local persistence failed after payment link was opened; compensating"
            );
            // 5. Compensate the already-opened remote link.
            self.cancel_with_retries(order_code).await;
            return Err(DonationError::Persistence);
        }

        // 6. Best-effort pending notice; never fails the donation.
        self.enqueue_pending_notice(&donation, order_code, donor_name, &link.checkout_url)
            .await;

        tracing::info!(
            donation_id = %donation.id,
            order_code = %order_code,
            amount = amount.value(),
            "Donation created, awaiting payment"
        );

        // 7. Hand the payment instructions straight back to the donor.
        Ok(PaymentInstructions {
            donation_id: donation.id,
            order_code,
            amount: amount.value(),
            description,
            checkout_url: link.checkout_url,
            qr_code: link.qr_code,
            payment_link_id: link.payment_link_id,
            bank_id: link.bank_id,
            account_number: link.account_number,
            account_name: link.account_name,
        })
    }

    /// Cancel the remote payment link with bounded exponential backoff.
    ///
    /// Exhaustion does not propagate: the request already failed, and the
    /// dangling link is handed to an operator through the log record.
    async fn cancel_with_retries(&self, order_code: OrderCode) {
        let policy = Backoff::new(CANCEL_ATTEMPTS, CANCEL_BACKOFF_BASE);
        let outcome = retry::with_backoff(self.sleeper.as_ref(), policy, || {
            self.gateway
                .cancel_payment_link(order_code, "donation persistence failed")
        })
        .await;

        match outcome {
            Ok(()) => {
                tracing::info!(order_code = %order_code, "Compensating cancellation succeeded");
            }
            Err(error) => {
                tracing::error!(
                    manual_intervention = true,
                    order_code = %order_code,
                    attempts = CANCEL_ATTEMPTS,
                    error = %error,
                    "Payment link could not be cancelled; cancel it manually at the gateway"
                );
            }
        }
    }

    async fn enqueue_pending_notice(
        &self,
        donation: &Donation,
        order_code: OrderCode,
        donor_name: Option<String>,
        checkout_url: &Option<String>,
    ) {
        let event = QueueEvent::DonationPending {
            donation_id: donation.id,
            campaign_id: donation.campaign_id,
            amount: donation.amount.value(),
            order_code,
            donor_name,
            checkout_url: checkout_url.clone(),
        };

        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(donation_id = %donation.id, error = %error, "Failed to encode pending notice");
                return;
            }
        };

        if let Err(error) = self.queue.send(body).await {
            tracing::warn!(
                donation_id = %donation.id,
                order_code = %order_code,
                error = %error,
                "Failed to enqueue pending notice; payment transaction remains the source of truth"
            );
        }
    }
}
