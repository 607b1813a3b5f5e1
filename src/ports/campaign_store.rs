//! CampaignStore port - read access to campaign snapshots.
//!
//! Campaign CRUD lives in the campaign service; the donation flow only
//! reads the phase/stats snapshot and asks for cache invalidation after
//! money-related changes.

use async_trait::async_trait;

use crate::domain::donation::Campaign;
use crate::domain::foundation::{CampaignId, DomainError};

/// Port for reading campaign snapshots.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Load the donation-relevant view of a campaign.
    async fn find_by_id(&self, id: CampaignId) -> Result<Option<Campaign>, DomainError>;
}

/// Port for the campaign read cache owned by the campaign service.
///
/// Invalidation is best-effort: a miss only costs a stale read until the
/// next refresh, so failures are logged and never propagated into the
/// financial path.
#[async_trait]
pub trait CampaignCache: Send + Sync {
    /// Drop any cached projections of the campaign.
    async fn invalidate(&self, id: CampaignId) -> Result<(), DomainError>;
}
