//! PayOS wire types and request/webhook signing.
//!
//! Signatures are HMAC-SHA256 over the signed object's fields rendered as
//! `key=value` pairs, keys sorted ascending, joined with `&`, hex-encoded
//! lowercase. Null values render as the empty string.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Body of `POST /v2/payment-requests`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub return_url: String,
    pub cancel_url: String,
    pub signature: String,
}

/// Body of `POST /v2/payment-requests/{orderCode}/cancel`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPaymentRequest {
    pub cancellation_reason: String,
}

/// Envelope every PayOS response arrives in. `code == "00"` is success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub desc: String,
    pub data: Option<T>,
}

/// Payment link fields returned on creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkData {
    #[serde(default)]
    pub bin: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub payment_link_id: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

/// Renders the canonical `key=value&...` string for an object and signs it.
///
/// Only flat objects are signed by the gateway; nested values are rendered
/// in their JSON form.
pub fn signature_of(secret: &str, payload: &JsonValue) -> String {
    let canonical = canonical_string(payload);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn canonical_string(payload: &JsonValue) -> String {
    let Some(object) = payload.as_object() else {
        return String::new();
    };

    let sorted: BTreeMap<&String, &JsonValue> = object.iter().collect();
    sorted
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, render(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
