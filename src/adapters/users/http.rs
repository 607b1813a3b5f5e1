//! HTTP implementation of the UserDirectory port.
//!
//! The user service owns donor identity, statistics, and badges; this
//! client consumes its internal JSON API as named operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::UsersConfig;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalUserId, UserId};
use crate::ports::{DonorProfile, DonorTotals, UpdateDonorStats, UserDirectory};

/// HTTP `UserDirectory` adapter.
pub struct HttpUserDirectory {
    base_url: String,
    http: reqwest::Client,
}

impl HttpUserDirectory {
    pub fn new(config: &UsersConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    badge_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsRequest {
    amount_to_add: i64,
    increment_count: u32,
    last_donation_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    total_donated: i64,
    donation_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AwardBadgeRequest<'a> {
    badge_id: &'a str,
}

fn rpc_error(error: reqwest::Error) -> DomainError {
    DomainError::new(ErrorCode::InternalError, format!("user service: {}", error))
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_user_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<DonorProfile>, DomainError> {
        let response = self
            .http
            .get(format!(
                "{}/internal/users/by-external-id/{}",
                self.base_url, external_id
            ))
            .send()
            .await
            .map_err(rpc_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().map_err(rpc_error)?;
        let user: UserResponse = response.json().await.map_err(rpc_error)?;

        Ok(Some(DonorProfile {
            id: UserId::from_uuid(user.id),
            full_name: user.full_name,
            username: user.username,
            email: user.email,
            badge_id: user.badge_id,
        }))
    }

    async fn update_donor_stats(
        &self,
        request: UpdateDonorStats,
    ) -> Result<DonorTotals, DomainError> {
        let body = StatsRequest {
            amount_to_add: request.amount_to_add,
            increment_count: request.increment_count,
            last_donation_at: request.last_donation_at.as_datetime().to_rfc3339(),
        };

        let response = self
            .http
            .post(format!(
                "{}/internal/donors/{}/stats",
                self.base_url, request.donor_id
            ))
            .json(&body)
            .send()
            .await
            .map_err(rpc_error)?
            .error_for_status()
            .map_err(rpc_error)?;

        let totals: StatsResponse = response.json().await.map_err(rpc_error)?;
        Ok(DonorTotals {
            total_donated: totals.total_donated,
            donation_count: totals.donation_count,
        })
    }

    async fn award_badge(&self, user_id: UserId, badge_id: &str) -> Result<(), DomainError> {
        self.http
            .post(format!("{}/internal/users/{}/badge", self.base_url, user_id))
            .json(&AwardBadgeRequest { badge_id })
            .send()
            .await
            .map_err(rpc_error)?
            .error_for_status()
            .map_err(rpc_error)?;
        Ok(())
    }
}
