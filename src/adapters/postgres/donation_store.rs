//! PostgreSQL implementation of DonationStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::donation::{
    CounterpartyAccount, Donation, PaymentStatus, PaymentTransaction,
};
use crate::domain::foundation::{
    Amount, CampaignId, DomainError, DonationId, ErrorCode, ExternalUserId, OrderCode,
    PaymentTransactionId, Timestamp,
};
use crate::ports::{DonationStore, PaymentResolution, TransitionOutcome};

/// PostgreSQL `DonationStore` adapter.
pub struct PostgresDonationStore {
    pool: PgPool,
}

impl PostgresDonationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: Uuid,
    donor_external_id: Option<String>,
    campaign_id: Uuid,
    amount: i64,
    message: Option<String>,
    is_anonymous: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = DomainError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let donor_external_id = row
            .donor_external_id
            .map(ExternalUserId::new)
            .transpose()
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;
        Ok(Donation {
            id: DonationId::from_uuid(row.id),
            donor_external_id,
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            amount: Amount::new(row.amount)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            message: row.message,
            is_anonymous: row.is_anonymous,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    donation_id: Uuid,
    order_code: i64,
    amount: i64,
    payment_link_id: Option<String>,
    checkout_url: Option<String>,
    qr_code: Option<String>,
    status: String,
    error_code: Option<String>,
    error_description: Option<String>,
    counterparty_account_name: Option<String>,
    counterparty_account_number: Option<String>,
    counterparty_bank_name: Option<String>,
    counterparty_bank_id: Option<String>,
    transaction_date_time: Option<String>,
    gateway_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentTransaction {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;
        let has_counterparty = row.counterparty_account_name.is_some()
            || row.counterparty_account_number.is_some()
            || row.counterparty_bank_name.is_some();
        let counterparty = has_counterparty.then(|| CounterpartyAccount {
            account_name: row.counterparty_account_name,
            account_number: row.counterparty_account_number,
            bank_name: row.counterparty_bank_name,
            bank_id: row.counterparty_bank_id,
            transaction_date_time: row.transaction_date_time,
            reference: row.gateway_reference,
        });

        Ok(PaymentTransaction {
            id: PaymentTransactionId::from_uuid(row.id),
            donation_id: DonationId::from_uuid(row.donation_id),
            order_code: OrderCode::from_i64(row.order_code),
            amount: Amount::new(row.amount)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            payment_link_id: row.payment_link_id,
            checkout_url: row.checkout_url,
            qr_code: row.qr_code,
            status,
            error_code: row.error_code,
            error_description: row.error_description,
            counterparty,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(error: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, error.to_string())
}

#[async_trait]
impl DonationStore for PostgresDonationStore {
    async fn insert_pending(
        &self,
        donation: &Donation,
        payment: &PaymentTransaction,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO donations (
                id, donor_external_id, campaign_id, amount, message, is_anonymous,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(donation.id.as_uuid())
        .bind(donation.donor_external_id.as_ref().map(|d| d.as_str()))
        .bind(donation.campaign_id.as_uuid())
        .bind(donation.amount.value())
        .bind(&donation.message)
        .bind(donation.is_anonymous)
        .bind(donation.created_at.as_datetime())
        .bind(donation.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, donation_id, order_code, amount, payment_link_id, checkout_url,
                qr_code, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.donation_id.as_uuid())
        .bind(payment.order_code.value())
        .bind(payment.amount.value())
        .bind(&payment.payment_link_id)
        .bind(&payment.checkout_url)
        .bind(&payment.qr_code)
        .bind(payment.status.as_str())
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)
    }

    async fn find_payment_by_order_code(
        &self,
        order_code: OrderCode,
    ) -> Result<Option<PaymentTransaction>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payment_transactions WHERE order_code = $1",
        )
        .bind(order_code.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    async fn find_donation(&self, id: DonationId) -> Result<Option<Donation>, DomainError> {
        let row = sqlx::query_as::<_, DonationRow>("SELECT * FROM donations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Donation::try_from).transpose()
    }

    async fn find_donation_by_order_code(
        &self,
        order_code: OrderCode,
    ) -> Result<Option<Donation>, DomainError> {
        let row = sqlx::query_as::<_, DonationRow>(
            r#"
            SELECT d.* FROM donations d
            JOIN payment_transactions p ON p.donation_id = d.id
            WHERE p.order_code = $1
            "#,
        )
        .bind(order_code.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Donation::try_from).transpose()
    }

    async fn resolve_payment(
        &self,
        order_code: OrderCode,
        resolution: PaymentResolution,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Row lock so concurrent webhook deliveries serialize on the guard.
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payment_transactions WHERE order_code = $1 FOR UPDATE",
        )
        .bind(order_code.value())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Err(DomainError::new(
                ErrorCode::PaymentTransactionNotFound,
                format!("no payment transaction for order {}", order_code),
            ));
        };

        let payment = PaymentTransaction::try_from(row)?;
        if payment.status != PaymentStatus::Pending {
            tx.rollback().await.map_err(db_error)?;
            return Ok(TransitionOutcome::AlreadyTerminal);
        }

        let now = Utc::now();
        match resolution {
            PaymentResolution::Succeeded {
                counterparty,
                outbox_event,
            } => {
                sqlx::query(
                    r#"
                    UPDATE payment_transactions SET
                        status = $2,
                        error_code = NULL,
                        error_description = NULL,
                        counterparty_account_name = $3,
                        counterparty_account_number = $4,
                        counterparty_bank_name = $5,
                        counterparty_bank_id = $6,
                        transaction_date_time = $7,
                        gateway_reference = $8,
                        updated_at = $9
                    WHERE id = $1
                    "#,
                )
                .bind(payment.id.as_uuid())
                .bind(PaymentStatus::Success.as_str())
                .bind(&counterparty.account_name)
                .bind(&counterparty.account_number)
                .bind(&counterparty.bank_name)
                .bind(&counterparty.bank_id)
                .bind(&counterparty.transaction_date_time)
                .bind(&counterparty.reference)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

                sqlx::query(
                    r#"
                    UPDATE campaigns SET
                        received_amount = received_amount + $2,
                        donation_count = donation_count + 1,
                        updated_at = $3
                    WHERE id = (SELECT campaign_id FROM donations WHERE id = $1)
                    "#,
                )
                .bind(payment.donation_id.as_uuid())
                .bind(payment.amount.value())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

                sqlx::query(
                    r#"
                    INSERT INTO outbox_events (id, event_type, payload, status, created_at, updated_at)
                    VALUES ($1, $2, $3, 'pending', $4, $4)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&outbox_event.event_type)
                .bind(&outbox_event.payload)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
            PaymentResolution::Failed {
                error_code,
                error_description,
                counterparty,
            } => {
                let counterparty = counterparty.unwrap_or_default();
                sqlx::query(
                    r#"
                    UPDATE payment_transactions SET
                        status = $2,
                        error_code = $3,
                        error_description = $4,
                        counterparty_account_name = $5,
                        counterparty_account_number = $6,
                        counterparty_bank_name = $7,
                        counterparty_bank_id = $8,
                        transaction_date_time = $9,
                        gateway_reference = $10,
                        updated_at = $11
                    WHERE id = $1
                    "#,
                )
                .bind(payment.id.as_uuid())
                .bind(PaymentStatus::Failed.as_str())
                .bind(error_code)
                .bind(error_description)
                .bind(&counterparty.account_name)
                .bind(&counterparty.account_number)
                .bind(&counterparty.bank_name)
                .bind(&counterparty.bank_id)
                .bind(&counterparty.transaction_date_time)
                .bind(&counterparty.reference)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        tx.commit().await.map_err(db_error)?;
        Ok(TransitionOutcome::Applied)
    }
}
