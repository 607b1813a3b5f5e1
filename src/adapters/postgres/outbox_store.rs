//! PostgreSQL implementation of OutboxStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{NewOutboxEvent, OutboxEvent, OutboxStatus, OutboxStore};

/// PostgreSQL `OutboxStore` adapter.
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: Uuid,
    event_type: String,
    payload: JsonValue,
    status: String,
    retry_count: i32,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OutboxRow> for OutboxEvent {
    type Error = DomainError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        let status = OutboxStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("invalid outbox status: {}", row.status),
            )
        })?;
        Ok(OutboxEvent {
            id: row.id,
            event_type: row.event_type,
            payload: row.payload,
            status,
            retry_count: row.retry_count,
            last_error: row.last_error,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(error: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, error.to_string())
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    async fn append(&self, event: NewOutboxEvent) -> Result<OutboxEvent, DomainError> {
        let row = sqlx::query_as::<_, OutboxRow>(
            r#"
            INSERT INTO outbox_events (id, event_type, payload, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&event.event_type)
        .bind(&event.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        OutboxEvent::try_from(row)
    }

    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxEvent>, DomainError> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            SELECT * FROM outbox_events
            WHERE status = 'pending'
            ORDER BY created_at
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(OutboxEvent::try_from).collect()
    }

    async fn mark_processing(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE outbox_events SET status = 'processing', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE outbox_events SET status = 'completed', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str, requeue: bool) -> Result<(), DomainError> {
        let status = if requeue { "pending" } else { "failed" };
        sqlx::query(
            r#"
            UPDATE outbox_events SET
                status = $2,
                retry_count = retry_count + 1,
                last_error = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
