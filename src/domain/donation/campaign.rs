//! Campaign snapshot consumed by the donation flow.
//!
//! Campaign lifecycle management belongs to the campaign service; the
//! donation path only needs to know whether a campaign currently accepts
//! money and how much it has received against its target.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CampaignId, Timestamp};

/// Lifecycle status as managed by the campaign service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the storage form, defaulting unknown values to Draft.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => CampaignStatus::Active,
            "completed" => CampaignStatus::Completed,
            "cancelled" => CampaignStatus::Cancelled,
            _ => CampaignStatus::Draft,
        }
    }
}

/// Where a campaign sits relative to its fundraising window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignPhase {
    /// Fundraising has not started yet.
    Upcoming,
    /// Active and inside the fundraising window; donations accepted.
    Open,
    /// Fundraising window has passed.
    Ended,
    /// Not active (draft, completed, cancelled, or disabled).
    Closed,
}

/// Read model of a campaign for donation purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    pub status: CampaignStatus,
    pub is_active: bool,
    pub fundraising_start_date: Timestamp,
    pub fundraising_end_date: Timestamp,
    pub target_amount: i64,
    pub received_amount: i64,
    pub donation_count: i64,
}

impl Campaign {
    /// Resolves the campaign's phase at the given moment.
    pub fn phase(&self, now: Timestamp) -> CampaignPhase {
        if !self.is_active || self.status != CampaignStatus::Active {
            return CampaignPhase::Closed;
        }
        if now.is_before(&self.fundraising_start_date) {
            return CampaignPhase::Upcoming;
        }
        if now.is_after(&self.fundraising_end_date) {
            return CampaignPhase::Ended;
        }
        CampaignPhase::Open
    }

    /// Amount received beyond the target, if any.
    pub fn surplus(&self) -> Option<i64> {
        if self.received_amount > self.target_amount {
            Some(self.received_amount - self.target_amount)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(status: CampaignStatus, is_active: bool) -> Campaign {
        let now = Timestamp::from_unix_secs(1_700_000_000);
        Campaign {
            id: CampaignId::new(),
            title: "Warm Meals".to_string(),
            status,
            is_active,
            fundraising_start_date: now.minus_days(7),
            fundraising_end_date: now.plus_days(7),
            target_amount: 10_000_000,
            received_amount: 0,
            donation_count: 0,
        }
    }

    #[test]
    fn active_campaign_inside_window_is_open() {
        let c = campaign(CampaignStatus::Active, true);
        let now = Timestamp::from_unix_secs(1_700_000_000);
        assert_eq!(c.phase(now), CampaignPhase::Open);
    }

    #[test]
    fn campaign_before_window_is_upcoming() {
        let c = campaign(CampaignStatus::Active, true);
        let before = c.fundraising_start_date.minus_days(1);
        assert_eq!(c.phase(before), CampaignPhase::Upcoming);
    }

    #[test]
    fn campaign_after_window_is_ended() {
        let c = campaign(CampaignStatus::Active, true);
        let after = c.fundraising_end_date.plus_days(1);
        assert_eq!(c.phase(after), CampaignPhase::Ended);
    }

    #[test]
    fn inactive_or_non_active_status_is_closed() {
        let now = Timestamp::from_unix_secs(1_700_000_000);
        assert_eq!(
            campaign(CampaignStatus::Active, false).phase(now),
            CampaignPhase::Closed
        );
        assert_eq!(
            campaign(CampaignStatus::Completed, true).phase(now),
            CampaignPhase::Closed
        );
        assert_eq!(
            campaign(CampaignStatus::Draft, true).phase(now),
            CampaignPhase::Closed
        );
    }

    #[test]
    fn surplus_only_when_over_target() {
        let mut c = campaign(CampaignStatus::Active, true);
        assert_eq!(c.surplus(), None);

        c.received_amount = c.target_amount;
        assert_eq!(c.surplus(), None);

        c.received_amount = c.target_amount + 250_000;
        assert_eq!(c.surplus(), Some(250_000));
    }
}
