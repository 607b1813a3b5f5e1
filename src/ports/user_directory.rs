//! UserDirectory port - collaborator operations on the user service.
//!
//! Donor identity, statistics, and badges are owned by the user service;
//! this port exposes them as named operations with typed requests and
//! responses. Everything here is called from best-effort paths.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ExternalUserId, Timestamp, UserId};

/// Donor as known to the user service.
#[derive(Debug, Clone, PartialEq)]
pub struct DonorProfile {
    pub id: UserId,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Badge currently held, if any.
    pub badge_id: Option<String>,
}

impl DonorProfile {
    /// Best display name available.
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
    }
}

/// Request to fold a confirmed donation into the donor's statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDonorStats {
    pub donor_id: UserId,
    pub amount_to_add: i64,
    pub increment_count: u32,
    pub last_donation_at: Timestamp,
}

/// Donor totals after a statistics update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonorTotals {
    pub total_donated: i64,
    pub donation_count: i64,
}

/// Port for the user service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve an identity-provider id to a donor profile.
    async fn get_user_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<DonorProfile>, DomainError>;

    /// Add a confirmed donation to the donor's running totals.
    async fn update_donor_stats(
        &self,
        request: UpdateDonorStats,
    ) -> Result<DonorTotals, DomainError>;

    /// Award (or upgrade to) the given badge. The user service replaces a
    /// lower-priority badge and no-ops when the donor already holds this one.
    async fn award_badge(&self, user_id: UserId, badge_id: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn display_name_prefers_full_name() {
        let profile = DonorProfile {
            id: UserId::from_uuid(Uuid::new_v4()),
            full_name: Some("An Nguyen".to_string()),
            username: Some("an.nguyen".to_string()),
            email: None,
            badge_id: None,
        };
        assert_eq!(profile.display_name(), Some("An Nguyen"));
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let profile = DonorProfile {
            id: UserId::from_uuid(Uuid::new_v4()),
            full_name: None,
            username: Some("an.nguyen".to_string()),
            email: None,
            badge_id: None,
        };
        assert_eq!(profile.display_name(), Some("an.nguyen"));
    }
}
