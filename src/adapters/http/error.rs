//! HTTP error mapping.
//!
//! Application errors map onto status codes with structured JSON bodies;
//! internal failure detail stays in the logs, not the response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::WebhookError;
use crate::domain::donation::DonationError;

/// API-facing error with a safe message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::ServiceUnavailable(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.message(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

impl From<DonationError> for ApiError {
    fn from(error: DonationError) -> Self {
        match error {
            DonationError::Validation(message) => ApiError::BadRequest(message),
            DonationError::CampaignNotFound => {
                ApiError::NotFound("Campaign not found".to_string())
            }
            DonationError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            DonationError::GatewayUnavailable => {
                ApiError::ServiceUnavailable(error.to_string())
            }
            DonationError::Persistence => ApiError::Internal(error.to_string()),
            DonationError::Internal(inner) => {
                tracing::error!(error = %inner, "Internal error on donation request");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(error: WebhookError) -> Self {
        match error {
            WebhookError::InvalidSignature => {
                ApiError::BadRequest("Invalid webhook signature".to_string())
            }
            WebhookError::UnknownOrderCode => {
                ApiError::BadRequest("Payment transaction not found".to_string())
            }
            WebhookError::Store(inner) => {
                tracing::error!(error = %inner, "Store failure during webhook reconciliation");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}
