//! BadgeAwardService - side-effecting caller around the milestone matcher.
//!
//! Awards only when the matched milestone differs from what the donor
//! already holds. Award failures are logged and never propagate into the
//! financial flow that triggered the check.

use std::sync::Arc;

use crate::domain::donation::MilestoneTable;
use crate::ports::{DonorProfile, DonorTotals, UserDirectory};

/// Application service for donor badge upgrades.
pub struct BadgeAwardService {
    milestones: MilestoneTable,
    users: Arc<dyn UserDirectory>,
}

impl BadgeAwardService {
    pub fn new(milestones: MilestoneTable, users: Arc<dyn UserDirectory>) -> Self {
        Self { milestones, users }
    }

    /// Match the donor's cumulative total and award the badge when it
    /// differs from the current one. Never fails the caller.
    pub async fn check_and_award(&self, profile: &DonorProfile, totals: DonorTotals) {
        let Some(milestone) = self.milestones.match_total(totals.total_donated) else {
            tracing::debug!(
                donor_id = %profile.id,
                total_donated = totals.total_donated,
                "No badge milestone reached"
            );
            return;
        };

        if profile.badge_id.as_deref() == Some(milestone.badge_id.as_str()) {
            tracing::debug!(
                donor_id = %profile.id,
                badge = %milestone.name,
                "Donor already holds the matched badge"
            );
            return;
        }

        match self.users.award_badge(profile.id, &milestone.badge_id).await {
            Ok(()) => {
                tracing::info!(
                    donor_id = %profile.id,
                    badge = %milestone.name,
                    total_donated = totals.total_donated,
                    "Awarded badge"
                );
            }
            Err(error) => {
                tracing::warn!(
                    donor_id = %profile.id,
                    badge = %milestone.name,
                    error = %error,
                    "Badge award failed"
                );
            }
        }
    }
}
