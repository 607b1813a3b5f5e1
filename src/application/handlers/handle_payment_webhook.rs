//! HandlePaymentWebhookHandler - reconciles gateway confirmations.
//!
//! The gateway's status code is never trusted on its own: a reported
//! success must also carry the exact expected amount and a transfer
//! description that references this order, otherwise the payment is marked
//! failed locally with a machine-readable reason.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::donation::{
    CounterpartyAccount, Donation, PaymentSucceeded, EVENT_PAYMENT_SUCCEEDED, GATEWAY_TAG,
};
use crate::domain::foundation::{DomainError, OrderCode, StateMachine};
use crate::ports::{
    DonationStore, NewOutboxEvent, PaymentGateway, PaymentResolution, TransitionOutcome,
    WebhookData, WebhookPayload,
};

/// Local failure reason: gateway said success but the amount differs.
const REASON_AMOUNT_MISMATCH: &str = "AMOUNT_MISMATCH";

/// Local failure reason: gateway said success but the transfer description
/// does not reference this order.
const REASON_DESCRIPTION_MISMATCH: &str = "DESCRIPTION_MISMATCH";

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Exactly one state transition was applied.
    Processed,
    /// The transaction was already terminal; nothing was re-applied.
    AlreadyProcessed,
}

/// Errors surfaced to the webhook endpoint.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not verify; no state was read or written.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// No payment transaction carries this order code.
    #[error("Payment transaction not found")]
    UnknownOrderCode,

    /// The store failed mid-reconciliation.
    #[error(transparent)]
    Store(DomainError),
}

/// Handler for gateway payment webhooks.
pub struct HandlePaymentWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn DonationStore>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn DonationStore>) -> Self {
        Self { gateway, store }
    }

    pub async fn handle(&self, payload: WebhookPayload) -> Result<WebhookOutcome, WebhookError> {
        // 1. Signature first; an unsigned payload never touches state.
        self.gateway
            .verify_webhook(&payload)
            .await
            .map_err(|_| WebhookError::InvalidSignature)?;

        let data = payload.data;
        let order_code = OrderCode::from_i64(data.order_code);

        // 2. Resolve the payment this confirmation belongs to.
        let payment = self
            .store
            .find_payment_by_order_code(order_code)
            .await
            .map_err(WebhookError::Store)?
            .ok_or(WebhookError::UnknownOrderCode)?;

        // 3. Idempotency guard: terminal rows are never re-transitioned.
        if payment.status.is_terminal() {
            let success_repeat = matches!(
                payment.status,
                crate::domain::donation::PaymentStatus::Success
            ) && data.gateway_reports_success();
            let failure_repeat = matches!(
                payment.status,
                crate::domain::donation::PaymentStatus::Failed
            ) && !data.gateway_reports_success();

            if success_repeat || failure_repeat {
                tracing::info!(order_code = %order_code, "Duplicate webhook for settled payment; skipping");
            } else {
                // Conflicting duplicate, e.g. a success report for a payment
                // we already failed on validation. The terminal state stands.
                tracing::error!(
                    order_code = %order_code,
                    settled_status = payment.status.as_str(),
                    gateway_code = %data.code,
                    "Webhook conflicts with settled payment state; not re-transitioning"
                );
            }
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        // 4. Build the resolution, validating gateway-reported successes.
        let counterparty = counterparty_from(&data);
        let resolution = if data.gateway_reports_success() {
            let donation = self
                .store
                .find_donation_by_order_code(order_code)
                .await
                .map_err(WebhookError::Store)?
                .ok_or(WebhookError::UnknownOrderCode)?;

            if data.amount != payment.amount.value() {
                tracing::warn!(
                    order_code = %order_code,
                    expected = payment.amount.value(),
                    reported = data.amount,
                    "Gateway reported success with a mismatched amount"
                );
                PaymentResolution::Failed {
                    error_code: REASON_AMOUNT_MISMATCH.to_string(),
                    error_description: format!(
                        "expected {} but gateway reported {}",
                        payment.amount.value(),
                        data.amount
                    ),
                    counterparty: Some(counterparty),
                }
            } else if !description_references_order(&data.description, order_code, &donation) {
                tracing::warn!(
                    order_code = %order_code,
                    description = %data.description,
                    "Gateway reported success with an unrelated transfer description"
                );
                PaymentResolution::Failed {
                    error_code: REASON_DESCRIPTION_MISMATCH.to_string(),
                    error_description: format!(
                        "transfer description {:?} does not reference order {}",
                        data.description, order_code
                    ),
                    counterparty: Some(counterparty),
                }
            } else {
                let event = PaymentSucceeded {
                    order_code,
                    amount: payment.amount.value(),
                    payment_transaction_id: payment.id,
                    donation_id: donation.id,
                    campaign_id: donation.campaign_id,
                    donor_external_id: donation
                        .donor_external_id
                        .as_ref()
                        .map(|id| id.as_str().to_string()),
                    donor_name: None,
                    gateway: GATEWAY_TAG.to_string(),
                };
                let outbox_event = NewOutboxEvent::new(EVENT_PAYMENT_SUCCEEDED, &event)
                    .map_err(WebhookError::Store)?;
                PaymentResolution::Succeeded {
                    counterparty,
                    outbox_event,
                }
            }
        } else {
            tracing::warn!(
                order_code = %order_code,
                code = %data.code,
                description = %data.description,
                "Gateway reported payment failure"
            );
            PaymentResolution::Failed {
                error_code: data.code.clone(),
                error_description: data.description.clone(),
                counterparty: Some(counterparty),
            }
        };

        // 5./6. One guarded transition; on success the campaign stats
        // increment and outbox append ride the same transaction.
        match self
            .store
            .resolve_payment(order_code, resolution)
            .await
            .map_err(WebhookError::Store)?
        {
            TransitionOutcome::Applied => {
                tracing::info!(order_code = %order_code, "Webhook reconciled");
                Ok(WebhookOutcome::Processed)
            }
            TransitionOutcome::AlreadyTerminal => Ok(WebhookOutcome::AlreadyProcessed),
        }
    }
}

fn counterparty_from(data: &WebhookData) -> CounterpartyAccount {
    CounterpartyAccount {
        account_name: data.counterparty_account_name.clone(),
        account_number: data.counterparty_account_number.clone(),
        bank_name: data.counterparty_bank_name.clone(),
        bank_id: data.counterparty_bank_id.clone(),
        transaction_date_time: data.transaction_date_time.clone(),
        reference: data.reference.clone(),
    }
}

/// A plausible confirmation must mention the order code or the transfer
/// description we issued (banks sometimes re-case or pad the text).
fn description_references_order(
    description: &str,
    order_code: OrderCode,
    donation: &Donation,
) -> bool {
    let normalized = description.to_uppercase();
    normalized.contains(&order_code.to_string())
        || normalized.contains(&format!("DONATE {}", donation.id.short().to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::donation::{PaymentStatus, PaymentTransaction};
    use crate::domain::foundation::{Amount, CampaignId, DonationId, Timestamp};
    use crate::ports::{CreatePaymentLink, GatewayError, PaymentLink};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    struct StubGateway {
        valid_signature: bool,
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_payment_link(
            &self,
            _request: CreatePaymentLink,
        ) -> Result<PaymentLink, GatewayError> {
            unimplemented!("not used by the webhook handler")
        }

        async fn cancel_payment_link(
            &self,
            _order_code: OrderCode,
            _reason: &str,
        ) -> Result<(), GatewayError> {
            unimplemented!("not used by the webhook handler")
        }

        async fn verify_webhook(&self, _payload: &WebhookPayload) -> Result<(), GatewayError> {
            if self.valid_signature {
                Ok(())
            } else {
                Err(GatewayError::InvalidSignature)
            }
        }
    }

    struct StubStore {
        donation: Donation,
        payment: Mutex<PaymentTransaction>,
        resolutions: Mutex<Vec<PaymentResolution>>,
    }

    impl StubStore {
        fn new(status: PaymentStatus) -> Self {
            let now = Timestamp::now();
            let donation = Donation::new(
                CampaignId::new(),
                Amount::new(50_000).unwrap(),
                None,
                None,
                true,
                now,
            );
            let mut payment = PaymentTransaction::new_pending(
                donation.id,
                OrderCode::from_i64(1700000000000),
                Amount::new(50_000).unwrap(),
                Some("plink_1".to_string()),
                None,
                None,
                now,
            );
            match status {
                PaymentStatus::Pending => {}
                PaymentStatus::Success => payment
                    .succeed(CounterpartyAccount::default(), now)
                    .unwrap(),
                PaymentStatus::Failed => payment.fail("01", "declined", None, now).unwrap(),
            }
            Self {
                donation,
                payment: Mutex::new(payment),
                resolutions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DonationStore for StubStore {
        async fn insert_pending(
            &self,
            _donation: &Donation,
            _payment: &PaymentTransaction,
        ) -> Result<(), DomainError> {
            unimplemented!("not used by the webhook handler")
        }

        async fn find_payment_by_order_code(
            &self,
            order_code: OrderCode,
        ) -> Result<Option<PaymentTransaction>, DomainError> {
            let payment = self.payment.lock().unwrap();
            Ok((payment.order_code == order_code).then(|| payment.clone()))
        }

        async fn find_donation(&self, _id: DonationId) -> Result<Option<Donation>, DomainError> {
            Ok(Some(self.donation.clone()))
        }

        async fn find_donation_by_order_code(
            &self,
            _order_code: OrderCode,
        ) -> Result<Option<Donation>, DomainError> {
            Ok(Some(self.donation.clone()))
        }

        async fn resolve_payment(
            &self,
            _order_code: OrderCode,
            resolution: PaymentResolution,
        ) -> Result<TransitionOutcome, DomainError> {
            let mut payment = self.payment.lock().unwrap();
            if payment.status.is_terminal() {
                return Ok(TransitionOutcome::AlreadyTerminal);
            }
            let now = Timestamp::now();
            match &resolution {
                PaymentResolution::Succeeded { counterparty, .. } => {
                    payment.succeed(counterparty.clone(), now).unwrap();
                }
                PaymentResolution::Failed {
                    error_code,
                    error_description,
                    counterparty,
                } => {
                    payment
                        .fail(error_code.clone(), error_description.clone(), counterparty.clone(), now)
                        .unwrap();
                }
            }
            self.resolutions.lock().unwrap().push(resolution);
            Ok(TransitionOutcome::Applied)
        }
    }

    fn payload(code: &str, amount: i64, description: &str) -> WebhookPayload {
        WebhookPayload {
            data: WebhookData {
                order_code: 1700000000000,
                code: code.to_string(),
                description: description.to_string(),
                amount,
                counterparty_account_name: Some("NGUYEN VAN A".to_string()),
                counterparty_account_number: Some("00123456789".to_string()),
                counterparty_bank_name: Some("VCB".to_string()),
                counterparty_bank_id: Some("970436".to_string()),
                transaction_date_time: Some("2026-01-05 10:22:41".to_string()),
                reference: Some("FT26005123456".to_string()),
            },
            signature: "deadbeef".to_string(),
        }
    }

    fn handler(status: PaymentStatus, valid_signature: bool) -> (HandlePaymentWebhookHandler, Arc<StubStore>) {
        let store = Arc::new(StubStore::new(status));
        let handler = HandlePaymentWebhookHandler::new(
            Arc::new(StubGateway { valid_signature }),
            store.clone(),
        );
        (handler, store)
    }

    fn matching_description(store: &StubStore) -> String {
        format!("DONATE {} Warm Meals", store.donation.id.short())
    }

    // ══════════════════════════════════════════════════════════════
    // Signature and Resolution
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invalid_signature_is_rejected_without_state_change() {
        let (handler, store) = handler(PaymentStatus::Pending, false);

        let result = handler.handle(payload("00", 50_000, "anything")).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert_eq!(
            store.payment.lock().unwrap().status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn unknown_order_code_is_rejected() {
        let (handler, _store) = handler(PaymentStatus::Pending, true);
        let mut p = payload("00", 50_000, "x");
        p.data.order_code = 42;

        let result = handler.handle(p).await;

        assert!(matches!(result, Err(WebhookError::UnknownOrderCode)));
    }

    // ══════════════════════════════════════════════════════════════
    // Success Path
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn validated_success_transitions_and_appends_outbox_event() {
        let (handler, store) = handler(PaymentStatus::Pending, true);
        let description = matching_description(&store);

        let outcome = handler.handle(payload("00", 50_000, &description)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(store.payment.lock().unwrap().status, PaymentStatus::Success);

        let resolutions = store.resolutions.lock().unwrap();
        assert_eq!(resolutions.len(), 1);
        match &resolutions[0] {
            PaymentResolution::Succeeded { outbox_event, counterparty } => {
                assert_eq!(outbox_event.event_type, EVENT_PAYMENT_SUCCEEDED);
                assert_eq!(
                    counterparty.account_name.as_deref(),
                    Some("NGUYEN VAN A")
                );
            }
            other => panic!("expected success resolution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn description_with_order_code_also_passes() {
        let (handler, store) = handler(PaymentStatus::Pending, true);

        let outcome = handler
            .handle(payload("00", 50_000, "ck chuyen tien 1700000000000"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(store.payment.lock().unwrap().status, PaymentStatus::Success);
    }

    // ══════════════════════════════════════════════════════════════
    // Validation Overrides the Gateway Status
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn amount_mismatch_fails_despite_gateway_success() {
        let (handler, store) = handler(PaymentStatus::Pending, true);
        let description = matching_description(&store);

        let outcome = handler.handle(payload("00", 49_999, &description)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let payment = store.payment.lock().unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.error_code.as_deref(), Some(REASON_AMOUNT_MISMATCH));
    }

    #[tokio::test]
    async fn unrelated_description_fails_despite_gateway_success() {
        let (handler, store) = handler(PaymentStatus::Pending, true);

        let outcome = handler
            .handle(payload("00", 50_000, "rent for march"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let payment = store.payment.lock().unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(
            payment.error_code.as_deref(),
            Some(REASON_DESCRIPTION_MISMATCH)
        );
    }

    #[tokio::test]
    async fn gateway_failure_code_marks_payment_failed() {
        let (handler, store) = handler(PaymentStatus::Pending, true);

        let outcome = handler
            .handle(payload("07", 50_000, "suspicious transfer"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let payment = store.payment.lock().unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.error_code.as_deref(), Some("07"));
    }

    // ══════════════════════════════════════════════════════════════
    // Idempotency Guard
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn duplicate_success_webhook_is_skipped() {
        let (handler, store) = handler(PaymentStatus::Success, true);
        let description = matching_description(&store);

        let outcome = handler.handle(payload("00", 50_000, &description)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
        assert!(store.resolutions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_failure_webhook_is_skipped() {
        let (handler, store) = handler(PaymentStatus::Failed, true);

        let outcome = handler
            .handle(payload("07", 50_000, "declined again"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
        assert!(store.resolutions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn conflicting_report_for_settled_payment_is_not_reapplied() {
        let (handler, store) = handler(PaymentStatus::Failed, true);
        let description = matching_description(&store);

        // Gateway now claims success for a payment we already failed.
        let outcome = handler.handle(payload("00", 50_000, &description)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
        assert_eq!(store.payment.lock().unwrap().status, PaymentStatus::Failed);
    }
}
