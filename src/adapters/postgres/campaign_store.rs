//! PostgreSQL implementation of CampaignStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::donation::{Campaign, CampaignStatus};
use crate::domain::foundation::{CampaignId, DomainError, ErrorCode, Timestamp};
use crate::ports::CampaignStore;

/// PostgreSQL `CampaignStore` adapter.
pub struct PostgresCampaignStore {
    pool: PgPool,
}

impl PostgresCampaignStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    id: Uuid,
    title: String,
    status: String,
    is_active: bool,
    fundraising_start_date: DateTime<Utc>,
    fundraising_end_date: DateTime<Utc>,
    target_amount: i64,
    received_amount: i64,
    donation_count: i64,
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Self {
        Campaign {
            id: CampaignId::from_uuid(row.id),
            title: row.title,
            status: CampaignStatus::parse(&row.status),
            is_active: row.is_active,
            fundraising_start_date: Timestamp::from_datetime(row.fundraising_start_date),
            fundraising_end_date: Timestamp::from_datetime(row.fundraising_end_date),
            target_amount: row.target_amount,
            received_amount: row.received_amount,
            donation_count: row.donation_count,
        }
    }
}

#[async_trait]
impl CampaignStore for PostgresCampaignStore {
    async fn find_by_id(&self, id: CampaignId) -> Result<Option<Campaign>, DomainError> {
        let row = sqlx::query_as::<_, CampaignRow>(
            r#"
            SELECT id, title, status, is_active, fundraising_start_date,
                   fundraising_end_date, target_amount, received_amount, donation_count
            FROM campaigns WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;

        Ok(row.map(Campaign::from))
    }
}
