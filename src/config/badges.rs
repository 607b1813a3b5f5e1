//! Badge milestone configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::donation::{BadgeMilestone, MilestoneTable};

/// One configured badge tier.
#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneEntry {
    pub name: String,
    pub badge_id: String,
    pub min_amount: i64,
    pub priority: u32,
}

/// Badge milestone table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BadgeConfig {
    #[serde(default = "default_milestones")]
    pub milestones: Vec<MilestoneEntry>,
}

impl BadgeConfig {
    /// Build the domain milestone table (sorted by priority).
    pub fn milestone_table(&self) -> MilestoneTable {
        MilestoneTable::new(
            self.milestones
                .iter()
                .map(|m| BadgeMilestone {
                    name: m.name.clone(),
                    badge_id: m.badge_id.clone(),
                    min_amount: m.min_amount,
                    priority: m.priority,
                })
                .collect(),
        )
    }

    /// Validate badge configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.milestones.is_empty() {
            return Err(ValidationError::EmptyMilestones);
        }
        Ok(())
    }
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
        }
    }
}

// Amounts are VND.
fn default_milestones() -> Vec<MilestoneEntry> {
    vec![
        MilestoneEntry {
            name: "Diamond Donor".to_string(),
            badge_id: "badge-diamond".to_string(),
            min_amount: 500_000_000,
            priority: 110,
        },
        MilestoneEntry {
            name: "Platinum Donor".to_string(),
            badge_id: "badge-platinum".to_string(),
            min_amount: 100_000_000,
            priority: 100,
        },
        MilestoneEntry {
            name: "Gold Donor".to_string(),
            badge_id: "badge-gold".to_string(),
            min_amount: 10_000_000,
            priority: 90,
        },
        MilestoneEntry {
            name: "Silver Donor".to_string(),
            badge_id: "badge-silver".to_string(),
            min_amount: 1_000_000,
            priority: 80,
        },
        MilestoneEntry {
            name: "Bronze Donor".to_string(),
            badge_id: "badge-bronze".to_string(),
            min_amount: 100_000,
            priority: 70,
        },
        MilestoneEntry {
            name: "First Donation".to_string(),
            badge_id: "badge-first".to_string(),
            min_amount: 0,
            priority: 10,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_all_tiers() {
        let config = BadgeConfig::default();
        assert!(config.validate().is_ok());

        let table = config.milestone_table();
        assert_eq!(table.match_total(0).unwrap().name, "First Donation");
        assert_eq!(table.match_total(150_000).unwrap().name, "Bronze Donor");
        assert_eq!(table.match_total(600_000_000).unwrap().name, "Diamond Donor");
    }

    #[test]
    fn empty_milestones_fail_validation() {
        let config = BadgeConfig { milestones: vec![] };
        assert!(config.validate().is_err());
    }
}
