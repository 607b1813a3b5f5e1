//! Badge milestone matching.
//!
//! Milestones are static configuration; matching is a pure function over the
//! donor's cumulative donated amount. Awarding (and its failure handling)
//! lives with the side-effecting caller, not here.

use serde::{Deserialize, Serialize};

/// A badge tier a donor can reach by cumulative donated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeMilestone {
    pub name: String,
    pub badge_id: String,
    /// Minimum cumulative amount (minor units) required for this tier.
    pub min_amount: i64,
    /// Higher priority wins when several thresholds are met.
    pub priority: u32,
}

/// Milestones ordered by priority descending, so the first threshold an
/// amount meets is the highest tier the donor qualifies for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneTable {
    milestones: Vec<BadgeMilestone>,
}

impl MilestoneTable {
    /// Builds a table, sorting by priority descending.
    pub fn new(mut milestones: Vec<BadgeMilestone>) -> Self {
        milestones.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { milestones }
    }

    /// Returns the highest-priority milestone whose threshold the cumulative
    /// amount meets or exceeds, or `None` when nothing matches.
    pub fn match_total(&self, total_donated: i64) -> Option<&BadgeMilestone> {
        self.milestones
            .iter()
            .find(|m| total_donated >= m.min_amount)
    }

    /// All milestones in priority order.
    pub fn milestones(&self) -> &[BadgeMilestone] {
        &self.milestones
    }
}
