//! PayOS HTTP client implementing the `PaymentGateway` port.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::config::PaymentConfig;
use crate::domain::foundation::OrderCode;
use crate::ports::{
    CreatePaymentLink, GatewayError, PaymentGateway, PaymentLink, WebhookPayload,
};

use super::wire::{
    signature_of, ApiEnvelope, CancelPaymentRequest, CreatePaymentRequest, PaymentLinkData,
};

/// PayOS merchant API client.
pub struct PayOsGateway {
    client_id: String,
    api_key: SecretString,
    checksum_key: SecretString,
    base_url: String,
    http: reqwest::Client,
}

impl PayOsGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client_id: config.payos_client_id.clone(),
            api_key: config.payos_api_key.clone(),
            checksum_key: config.payos_checksum_key.clone(),
            base_url: config.payos_base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn sign_create_request(&self, request: &CreatePaymentLink) -> String {
        // The gateway signs exactly these five fields.
        let payload = json!({
            "amount": request.amount.value(),
            "cancelUrl": "",
            "description": request.description,
            "orderCode": request.order_code.value(),
            "returnUrl": "",
        });
        signature_of(self.checksum_key.expose_secret(), &payload)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<ApiEnvelope<T>, GatewayError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("x-client-id", &self.client_id)
            .header("x-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::Network(format!(
                "gateway answered {}",
                status
            )));
        }

        response
            .json::<ApiEnvelope<T>>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PayOsGateway {
    async fn create_payment_link(
        &self,
        request: CreatePaymentLink,
    ) -> Result<PaymentLink, GatewayError> {
        let signature = self.sign_create_request(&request);
        let body = CreatePaymentRequest {
            order_code: request.order_code.value(),
            amount: request.amount.value(),
            description: request.description.clone(),
            return_url: String::new(),
            cancel_url: String::new(),
            signature,
        };

        tracing::debug!(order_code = %request.order_code, "Opening payment link");
        let envelope: ApiEnvelope<PaymentLinkData> =
            self.post("/v2/payment-requests", &body).await?;

        if envelope.code != "00" {
            return Err(GatewayError::Rejected {
                code: envelope.code,
                message: envelope.desc,
            });
        }

        let data = envelope.data.ok_or_else(|| {
            GatewayError::InvalidResponse("success response without payment link data".to_string())
        })?;

        Ok(PaymentLink {
            payment_link_id: data.payment_link_id,
            checkout_url: data.checkout_url,
            qr_code: data.qr_code,
            bank_id: data.bin,
            account_number: data.account_number,
            account_name: data.account_name,
        })
    }

    async fn cancel_payment_link(
        &self,
        order_code: OrderCode,
        reason: &str,
    ) -> Result<(), GatewayError> {
        let body = CancelPaymentRequest {
            cancellation_reason: reason.to_string(),
        };

        tracing::debug!(order_code = %order_code, "Cancelling payment link");
        let envelope: ApiEnvelope<serde_json::Value> = self
            .post(&format!("/v2/payment-requests/{}/cancel", order_code), &body)
            .await?;

        if envelope.code != "00" {
            return Err(GatewayError::Rejected {
                code: envelope.code,
                message: envelope.desc,
            });
        }

        Ok(())
    }

    async fn verify_webhook(&self, payload: &WebhookPayload) -> Result<(), GatewayError> {
        let data = serde_json::to_value(&payload.data)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let expected = signature_of(self.checksum_key.expose_secret(), &data);

        let expected_bytes =
            hex::decode(&expected).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let provided_bytes =
            hex::decode(&payload.signature).map_err(|_| GatewayError::InvalidSignature)?;

        if expected_bytes.len() != provided_bytes.len()
            || expected_bytes.ct_eq(&provided_bytes).unwrap_u8() != 1
        {
            return Err(GatewayError::InvalidSignature);
        }

        Ok(())
    }
}
