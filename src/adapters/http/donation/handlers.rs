//! Axum handlers for the donation endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{Actor, CreateDonationCommand, CreateDonationHandler, HandlePaymentWebhookHandler};
use crate::domain::foundation::{CampaignId, DonationId, ExternalUserId};
use crate::ports::{DonationStore, WebhookPayload};

use super::dto::{CreateDonationRequest, DonationResponse, PaymentInstructionsResponse};
use crate::adapters::http::ApiError;

/// Shared state for the donation routes.
#[derive(Clone)]
pub struct DonationAppState {
    pub create_donation: Arc<CreateDonationHandler>,
    pub webhook: Arc<HandlePaymentWebhookHandler>,
    pub donations: Arc<dyn DonationStore>,
}

/// Identity headers set by the authenticating gateway in front of this
/// service. Absent headers mean a guest donor.
fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let external_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| ExternalUserId::new(v).ok())?;
    let display_name = headers
        .get("x-user-name")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Some(Actor {
        external_id,
        display_name,
    })
}

/// `POST /donations`
pub async fn create_donation(
    State(state): State<DonationAppState>,
    headers: HeaderMap,
    Json(request): Json<CreateDonationRequest>,
) -> Result<Json<PaymentInstructionsResponse>, ApiError> {
    let actor = actor_from_headers(&headers);
    let donor_name = actor.as_ref().and_then(|a| a.display_name.clone());

    let command = CreateDonationCommand {
        campaign_id: CampaignId::from_uuid(request.campaign_id),
        amount: request.amount,
        message: request.message,
        is_anonymous: request.is_anonymous,
    };

    let instructions = state.create_donation.handle(command, actor).await?;
    Ok(Json(PaymentInstructionsResponse::from_instructions(
        instructions,
        donor_name.as_deref(),
    )))
}

/// `POST /webhooks/payment`
pub async fn payment_webhook(
    State(state): State<DonationAppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.webhook.handle(payload).await?;
    // The gateway only needs an acknowledgment; duplicates included.
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `GET /donations/{id}`
pub async fn get_donation(
    State(state): State<DonationAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DonationResponse>, ApiError> {
    let donation = state
        .donations
        .find_donation(DonationId::from_uuid(id))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Donation lookup failed");
            ApiError::Internal("Internal server error".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(format!("Donation {} not found", id)))?;

    Ok(Json(DonationResponse::from(donation)))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
