//! Queue handler for pending-donation notices.
//!
//! Runs off the shared donation queue: tells the notification pipeline a
//! payment link is waiting and refreshes campaign projections. An error
//! here leaves the message on the queue for lease-expiry redelivery.

use std::sync::Arc;

use crate::domain::donation::QueueEvent;
use crate::domain::foundation::DomainError;
use crate::ports::{CampaignCache, DonationNotice, Notifier};

/// Handles `DONATION_PENDING` queue messages.
pub struct PendingDonationHandler {
    notifier: Arc<dyn Notifier>,
    cache: Arc<dyn CampaignCache>,
}

impl PendingDonationHandler {
    pub fn new(notifier: Arc<dyn Notifier>, cache: Arc<dyn CampaignCache>) -> Self {
        Self { notifier, cache }
    }

    pub async fn handle(&self, event: QueueEvent) -> Result<(), DomainError> {
        match event {
            QueueEvent::DonationPending {
                donation_id,
                campaign_id,
                amount,
                order_code,
                donor_name,
                checkout_url,
            } => {
                // The notification is this handler's job; its failure is the
                // queue's signal to redeliver.
                self.notifier
                    .notify(DonationNotice::PaymentPending {
                        donation_id,
                        campaign_id,
                        order_code,
                        amount,
                        checkout_url,
                        donor_name,
                    })
                    .await?;

                // Cache refresh is best-effort on top.
                if let Err(error) = self.cache.invalidate(campaign_id).await {
                    tracing::warn!(
                        campaign_id = %campaign_id,
                        error = %error,
                        "Campaign cache invalidation failed"
                    );
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CampaignId, DonationId, ErrorCode, OrderCode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct RecordingNotifier {
        fail: bool,
        notices: Mutex<Vec<DonationNotice>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notice: DonationNotice) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::new(ErrorCode::InternalError, "smtp down"));
            }
            self.notices.lock().unwrap().push(notice);
            Ok(())
        }
    }

    struct CountingCache {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CampaignCache for CountingCache {
        async fn invalidate(&self, _id: CampaignId) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn event() -> QueueEvent {
        QueueEvent::DonationPending {
            donation_id: DonationId::new(),
            campaign_id: CampaignId::new(),
            amount: 50_000,
            order_code: OrderCode::from_i64(1700000000000),
            donor_name: Some("An Nguyen".to_string()),
            checkout_url: None,
        }
    }

    #[tokio::test]
    async fn notifies_and_invalidates_cache() {
        let notifier = Arc::new(RecordingNotifier {
            fail: false,
            notices: Mutex::new(vec![]),
        });
        let cache = Arc::new(CountingCache {
            calls: AtomicU32::new(0),
        });
        let handler = PendingDonationHandler::new(notifier.clone(), cache.clone());

        handler.handle(event()).await.unwrap();

        assert_eq!(notifier.notices.lock().unwrap().len(), 1);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn notification_failure_propagates_for_redelivery() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            notices: Mutex::new(vec![]),
        });
        let cache = Arc::new(CountingCache {
            calls: AtomicU32::new(0),
        });
        let handler = PendingDonationHandler::new(notifier, cache.clone());

        let result = handler.handle(event()).await;

        assert!(result.is_err());
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
    }
}
