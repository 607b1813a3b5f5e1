//! Scriptable in-memory gateway for tests and local development.
//!
//! Mirrors the port contract without any network: payment links are handed
//! out from a counter, cancellations are recorded, and failures can be
//! scripted per operation.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::OrderCode;
use crate::ports::{
    CreatePaymentLink, GatewayError, PaymentGateway, PaymentLink, WebhookPayload,
};

/// In-memory `PaymentGateway` double.
#[derive(Default)]
pub struct MockGateway {
    fail_create: AtomicBool,
    fail_cancel: AtomicBool,
    reject_signature: AtomicBool,
    create_calls: AtomicU32,
    cancel_calls: AtomicU32,
    cancelled: Mutex<Vec<OrderCode>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next create calls to fail with a network error.
    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Script the next cancel calls to fail with a network error.
    pub fn fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    /// Script webhook verification to reject all signatures.
    pub fn reject_signature(&self, reject: bool) {
        self.reject_signature.store(reject, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    /// Order codes cancelled so far.
    pub fn cancelled(&self) -> Vec<OrderCode> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_link(
        &self,
        request: CreatePaymentLink,
    ) -> Result<PaymentLink, GatewayError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("mock gateway offline".to_string()));
        }
        Ok(PaymentLink {
            payment_link_id: Some(format!("plink_{}", call)),
            checkout_url: Some(format!("https://pay.example/plink_{}", call)),
            qr_code: Some(format!("0002010102{}", request.order_code)),
            bank_id: Some("970436".to_string()),
            account_number: Some("00123456789".to_string()),
            account_name: Some("GIVEBRIDGE FUND".to_string()),
        })
    }

    async fn cancel_payment_link(
        &self,
        order_code: OrderCode,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("mock gateway offline".to_string()));
        }
        self.cancelled.lock().unwrap().push(order_code);
        Ok(())
    }

    async fn verify_webhook(&self, _payload: &WebhookPayload) -> Result<(), GatewayError> {
        if self.reject_signature.load(Ordering::SeqCst) {
            return Err(GatewayError::InvalidSignature);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Amount;

    #[tokio::test]
    async fn create_hands_out_distinct_links() {
        let gateway = MockGateway::new();
        let request = CreatePaymentLink {
            order_code: OrderCode::from_i64(1),
            amount: Amount::new(1_000).unwrap(),
            description: "DONATE x".to_string(),
        };

        let first = gateway.create_payment_link(request.clone()).await.unwrap();
        let second = gateway.create_payment_link(request).await.unwrap();

        assert_ne!(first.payment_link_id, second.payment_link_id);
        assert_eq!(gateway.create_calls(), 2);
    }

    #[tokio::test]
    async fn scripted_failures_apply() {
        let gateway = MockGateway::new();
        gateway.fail_create(true);

        let request = CreatePaymentLink {
            order_code: OrderCode::from_i64(1),
            amount: Amount::new(1_000).unwrap(),
            description: "DONATE x".to_string(),
        };
        assert!(gateway.create_payment_link(request).await.is_err());

        gateway.fail_cancel(true);
        assert!(gateway
            .cancel_payment_link(OrderCode::from_i64(1), "test")
            .await
            .is_err());
        assert!(gateway.cancelled().is_empty());
    }
}
