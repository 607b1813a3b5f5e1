//! WalletLedger - idempotent credits against the append-only ledger.
//!
//! This is the single point that guards against duplicate credits from
//! overlapping webhook deliveries or outbox retries. The guard is a
//! check-then-insert on the credit key, with the store's unique index
//! converging any lost race onto the existing row.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::wallet::{CreditKey, WalletKind, WalletTransaction};
use crate::ports::{InsertOutcome, NewCredit, WalletStore};

/// Application service for wallet credits.
pub struct WalletLedger {
    wallets: Arc<dyn WalletStore>,
}

impl WalletLedger {
    pub fn new(wallets: Arc<dyn WalletStore>) -> Self {
        Self { wallets }
    }

    /// Credit a wallet, skipping duplicates.
    ///
    /// When an entry with the same `(wallet, payment ref, gateway, amount)`
    /// already exists, it is returned unchanged and the balance is not
    /// touched again.
    pub async fn credit(
        &self,
        owner_id: UserId,
        kind: WalletKind,
        credit: NewCredit,
    ) -> Result<WalletTransaction, DomainError> {
        let wallet = self
            .wallets
            .find_wallet(owner_id, kind)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::WalletNotFound,
                    format!(
                        "{} wallet not found for owner {}; wallets are provisioned explicitly",
                        kind.as_str(),
                        owner_id
                    ),
                )
            })?;

        if let (Some(payment_transaction_id), Some(gateway)) =
            (credit.payment_transaction_id, credit.gateway.as_ref())
        {
            let key = CreditKey {
                wallet_id: wallet.id,
                payment_transaction_id,
                gateway: gateway.clone(),
                amount: credit.amount,
            };
            if let Some(existing) = self.wallets.find_entry_by_credit_key(&key).await? {
                tracing::warn!(
                    wallet_id = %wallet.id,
                    payment_transaction_id = %payment_transaction_id,
                    gateway = %gateway,
                    amount = credit.amount,
                    existing_entry = %existing.id,
                    "Skipping duplicate credit"
                );
                return Ok(existing);
            }
        }

        let amount = credit.amount;
        match self.wallets.insert_credit(wallet.id, credit).await? {
            InsertOutcome::Inserted(entry) => {
                tracing::info!(
                    wallet_id = %wallet.id,
                    entry = %entry.id,
                    amount,
                    "Credited wallet"
                );
                Ok(entry)
            }
            InsertOutcome::Duplicate(entry) => {
                // Lost the race to a concurrent delivery; their credit stands.
                tracing::warn!(
                    wallet_id = %wallet.id,
                    entry = %entry.id,
                    "Concurrent duplicate credit detected by unique index"
                );
                Ok(entry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PaymentTransactionId, Timestamp, WalletId};
    use crate::domain::wallet::{TransactionType, Wallet};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory wallet store mirroring the transactional contract.
    struct TestWalletStore {
        wallet: Wallet,
        entries: Mutex<Vec<WalletTransaction>>,
        balance: Mutex<i64>,
        keys: Mutex<HashMap<(WalletId, PaymentTransactionId, String, i64), Uuid>>,
    }

    impl TestWalletStore {
        fn new(owner: UserId) -> Self {
            Self {
                wallet: Wallet::new(owner, WalletKind::Admin, Timestamp::now()),
                entries: Mutex::new(vec![]),
                balance: Mutex::new(0),
                keys: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl WalletStore for TestWalletStore {
        async fn find_wallet(
            &self,
            owner_id: UserId,
            kind: WalletKind,
        ) -> Result<Option<Wallet>, DomainError> {
            Ok((self.wallet.owner_id == owner_id && self.wallet.kind == kind)
                .then(|| self.wallet.clone()))
        }

        async fn find_entry_by_credit_key(
            &self,
            key: &CreditKey,
        ) -> Result<Option<WalletTransaction>, DomainError> {
            let keys = self.keys.lock().unwrap();
            let id = keys.get(&(
                key.wallet_id,
                key.payment_transaction_id,
                key.gateway.clone(),
                key.amount,
            ));
            let entries = self.entries.lock().unwrap();
            Ok(id.and_then(|id| entries.iter().find(|e| &e.id == id).cloned()))
        }

        async fn insert_credit(
            &self,
            wallet_id: WalletId,
            credit: NewCredit,
        ) -> Result<InsertOutcome, DomainError> {
            let entry = WalletTransaction {
                id: Uuid::new_v4(),
                wallet_id,
                campaign_id: credit.campaign_id,
                payment_transaction_id: credit.payment_transaction_id,
                amount: credit.amount,
                transaction_type: credit.transaction_type,
                gateway: credit.gateway,
                description: credit.description,
                metadata: credit.metadata,
                created_at: Timestamp::now(),
            };
            if let Some(key) = entry.credit_key() {
                let mut keys = self.keys.lock().unwrap();
                let tuple = (
                    key.wallet_id,
                    key.payment_transaction_id,
                    key.gateway.clone(),
                    key.amount,
                );
                if let Some(existing_id) = keys.get(&tuple) {
                    let entries = self.entries.lock().unwrap();
                    let existing = entries.iter().find(|e| &e.id == existing_id).unwrap();
                    return Ok(InsertOutcome::Duplicate(existing.clone()));
                }
                keys.insert(tuple, entry.id);
            }
            self.entries.lock().unwrap().push(entry.clone());
            *self.balance.lock().unwrap() += entry.amount;
            Ok(InsertOutcome::Inserted(entry))
        }
    }

    fn credit_request(payment: PaymentTransactionId, amount: i64) -> NewCredit {
        NewCredit {
            amount,
            transaction_type: TransactionType::DonationReceived,
            campaign_id: None,
            payment_transaction_id: Some(payment),
            gateway: Some("PAYOS".to_string()),
            description: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn credit_inserts_entry_and_increments_balance() {
        let owner = UserId::from_uuid(Uuid::new_v4());
        let store = Arc::new(TestWalletStore::new(owner));
        let ledger = WalletLedger::new(store.clone());

        let entry = ledger
            .credit(
                owner,
                WalletKind::Admin,
                credit_request(PaymentTransactionId::new(), 50_000),
            )
            .await
            .unwrap();

        assert_eq!(entry.amount, 50_000);
        assert_eq!(*store.balance.lock().unwrap(), 50_000);
        assert_eq!(store.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn identical_credit_twice_yields_one_entry_and_one_increment() {
        let owner = UserId::from_uuid(Uuid::new_v4());
        let store = Arc::new(TestWalletStore::new(owner));
        let ledger = WalletLedger::new(store.clone());
        let payment = PaymentTransactionId::new();

        let first = ledger
            .credit(owner, WalletKind::Admin, credit_request(payment, 50_000))
            .await
            .unwrap();
        let second = ledger
            .credit(owner, WalletKind::Admin, credit_request(payment, 50_000))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.entries.lock().unwrap().len(), 1);
        assert_eq!(*store.balance.lock().unwrap(), 50_000);
    }

    #[tokio::test]
    async fn different_amount_is_a_distinct_credit() {
        let owner = UserId::from_uuid(Uuid::new_v4());
        let store = Arc::new(TestWalletStore::new(owner));
        let ledger = WalletLedger::new(store.clone());
        let payment = PaymentTransactionId::new();

        ledger
            .credit(owner, WalletKind::Admin, credit_request(payment, 50_000))
            .await
            .unwrap();
        ledger
            .credit(owner, WalletKind::Admin, credit_request(payment, 70_000))
            .await
            .unwrap();

        assert_eq!(store.entries.lock().unwrap().len(), 2);
        assert_eq!(*store.balance.lock().unwrap(), 120_000);
    }

    #[tokio::test]
    async fn missing_wallet_is_an_error() {
        let owner = UserId::from_uuid(Uuid::new_v4());
        let other = UserId::from_uuid(Uuid::new_v4());
        let store = Arc::new(TestWalletStore::new(owner));
        let ledger = WalletLedger::new(store);

        let result = ledger
            .credit(
                other,
                WalletKind::Admin,
                credit_request(PaymentTransactionId::new(), 1_000),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::WalletNotFound);
    }
}
