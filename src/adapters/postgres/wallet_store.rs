//! PostgreSQL implementation of WalletStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CampaignId, DomainError, ErrorCode, PaymentTransactionId, Timestamp, UserId, WalletId,
};
use crate::domain::wallet::{CreditKey, TransactionType, Wallet, WalletKind, WalletTransaction};
use crate::ports::{InsertOutcome, NewCredit, WalletStore};

/// PostgreSQL `WalletStore` adapter.
pub struct PostgresWalletStore {
    pool: PgPool,
}

impl PostgresWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    owner_id: Uuid,
    wallet_kind: String,
    balance: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WalletRow> for Wallet {
    type Error = DomainError;

    fn try_from(row: WalletRow) -> Result<Self, Self::Error> {
        let kind = WalletKind::parse(&row.wallet_kind).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("invalid wallet kind: {}", row.wallet_kind),
            )
        })?;
        Ok(Wallet {
            id: WalletId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            kind,
            balance: row.balance,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    wallet_id: Uuid,
    campaign_id: Option<Uuid>,
    payment_transaction_id: Option<Uuid>,
    amount: i64,
    transaction_type: String,
    gateway: Option<String>,
    description: Option<String>,
    metadata: Option<JsonValue>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for WalletTransaction {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let transaction_type = TransactionType::parse(&row.transaction_type).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("invalid transaction type: {}", row.transaction_type),
            )
        })?;
        Ok(WalletTransaction {
            id: row.id,
            wallet_id: WalletId::from_uuid(row.wallet_id),
            campaign_id: row.campaign_id.map(CampaignId::from_uuid),
            payment_transaction_id: row.payment_transaction_id.map(PaymentTransactionId::from_uuid),
            amount: row.amount,
            transaction_type,
            gateway: row.gateway,
            description: row.description,
            metadata: row.metadata,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn db_error(error: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[async_trait]
impl WalletStore for PostgresWalletStore {
    async fn find_wallet(
        &self,
        owner_id: UserId,
        kind: WalletKind,
    ) -> Result<Option<Wallet>, DomainError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT * FROM wallets WHERE owner_id = $1 AND wallet_kind = $2",
        )
        .bind(owner_id.as_uuid())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Wallet::try_from).transpose()
    }

    async fn find_entry_by_credit_key(
        &self,
        key: &CreditKey,
    ) -> Result<Option<WalletTransaction>, DomainError> {
        let row = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT * FROM wallet_transactions
            WHERE wallet_id = $1 AND payment_transaction_id = $2
              AND gateway = $3 AND amount = $4
            "#,
        )
        .bind(key.wallet_id.as_uuid())
        .bind(key.payment_transaction_id.as_uuid())
        .bind(&key.gateway)
        .bind(key.amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(WalletTransaction::try_from).transpose()
    }

    async fn insert_credit(
        &self,
        wallet_id: WalletId,
        credit: NewCredit,
    ) -> Result<InsertOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let insert = sqlx::query_as::<_, LedgerRow>(
            r#"
            INSERT INTO wallet_transactions (
                id, wallet_id, campaign_id, payment_transaction_id, amount,
                transaction_type, gateway, description, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(wallet_id.as_uuid())
        .bind(credit.campaign_id.as_ref().map(|c| *c.as_uuid()))
        .bind(credit.payment_transaction_id.as_ref().map(|p| *p.as_uuid()))
        .bind(credit.amount)
        .bind(credit.transaction_type.as_str())
        .bind(&credit.gateway)
        .bind(&credit.description)
        .bind(&credit.metadata)
        .fetch_one(&mut *tx)
        .await;

        let row = match insert {
            Ok(row) => row,
            Err(error) if is_unique_violation(&error) => {
                // Lost a race on the credit key; the winner's entry stands.
                tx.rollback().await.map_err(db_error)?;
                let key = CreditKey {
                    wallet_id,
                    payment_transaction_id: credit.payment_transaction_id.ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::DatabaseError,
                            "unique violation without a payment reference",
                        )
                    })?,
                    gateway: credit.gateway.clone().unwrap_or_default(),
                    amount: credit.amount,
                };
                let existing = self.find_entry_by_credit_key(&key).await?.ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        "conflicting ledger entry disappeared",
                    )
                })?;
                return Ok(InsertOutcome::Duplicate(existing));
            }
            Err(error) => return Err(db_error(error)),
        };

        sqlx::query(
            "UPDATE wallets SET balance = balance + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(wallet_id.as_uuid())
        .bind(credit.amount)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(InsertOutcome::Inserted(WalletTransaction::try_from(row)?))
    }
}
