//! Shared in-memory store implementing the persistence ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::donation::{Campaign, Donation, PaymentTransaction};
use crate::domain::foundation::{
    CampaignId, DomainError, DonationId, ErrorCode, ExternalUserId, OrderCode, StateMachine,
    Timestamp, UserId, WalletId,
};
use crate::domain::wallet::{CreditKey, Wallet, WalletKind, WalletTransaction};
use crate::ports::{
    CampaignCache, CampaignStore, DonationNotice, DonationStore, DonorProfile, DonorTotals,
    InsertOutcome, NewCredit, NewOutboxEvent, Notifier, OutboxEvent, OutboxStatus, OutboxStore,
    PaymentResolution, TransitionOutcome, UpdateDonorStats, UserDirectory, WalletStore,
};

#[derive(Default)]
struct State {
    campaigns: HashMap<CampaignId, Campaign>,
    donations: HashMap<DonationId, Donation>,
    payments: HashMap<OrderCode, PaymentTransaction>,
    outbox: Vec<OutboxEvent>,
    wallets: HashMap<WalletId, Wallet>,
    ledger: Vec<WalletTransaction>,
}

/// In-memory implementation of the persistence ports.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a campaign snapshot.
    pub fn put_campaign(&self, campaign: Campaign) {
        self.state
            .lock()
            .unwrap()
            .campaigns
            .insert(campaign.id, campaign);
    }

    /// Provision a wallet, returning its id.
    pub fn put_wallet(&self, owner_id: UserId, kind: WalletKind) -> WalletId {
        let wallet = Wallet::new(owner_id, kind, Timestamp::now());
        let id = wallet.id;
        self.state.lock().unwrap().wallets.insert(id, wallet);
        id
    }

    /// Current balance of a wallet.
    pub fn balance(&self, wallet_id: WalletId) -> i64 {
        self.state.lock().unwrap().wallets[&wallet_id].balance
    }

    /// Snapshot of all ledger entries.
    pub fn ledger_entries(&self) -> Vec<WalletTransaction> {
        self.state.lock().unwrap().ledger.clone()
    }

    /// Snapshot of all outbox events.
    pub fn outbox_events(&self) -> Vec<OutboxEvent> {
        self.state.lock().unwrap().outbox.clone()
    }

    /// Campaign snapshot by id.
    pub fn campaign(&self, id: CampaignId) -> Option<Campaign> {
        self.state.lock().unwrap().campaigns.get(&id).cloned()
    }

    /// All stored payment transactions.
    pub fn payments(&self) -> Vec<PaymentTransaction> {
        self.state.lock().unwrap().payments.values().cloned().collect()
    }

    fn append_event(state: &mut State, event: NewOutboxEvent) -> OutboxEvent {
        let now = Timestamp::now();
        let event = OutboxEvent {
            id: Uuid::new_v4(),
            event_type: event.event_type,
            payload: event.payload,
            status: OutboxStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        state.outbox.push(event.clone());
        event
    }
}

#[async_trait]
impl DonationStore for InMemoryStore {
    async fn insert_pending(
        &self,
        donation: &Donation,
        payment: &PaymentTransaction,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.payments.contains_key(&payment.order_code) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("duplicate order code {}", payment.order_code),
            ));
        }
        state.donations.insert(donation.id, donation.clone());
        state.payments.insert(payment.order_code, payment.clone());
        Ok(())
    }

    async fn find_payment_by_order_code(
        &self,
        order_code: OrderCode,
    ) -> Result<Option<PaymentTransaction>, DomainError> {
        Ok(self.state.lock().unwrap().payments.get(&order_code).cloned())
    }

    async fn find_donation(&self, id: DonationId) -> Result<Option<Donation>, DomainError> {
        Ok(self.state.lock().unwrap().donations.get(&id).cloned())
    }

    async fn find_donation_by_order_code(
        &self,
        order_code: OrderCode,
    ) -> Result<Option<Donation>, DomainError> {
        let state = self.state.lock().unwrap();
        let donation_id = state.payments.get(&order_code).map(|p| p.donation_id);
        Ok(donation_id.and_then(|id| state.donations.get(&id).cloned()))
    }

    async fn resolve_payment(
        &self,
        order_code: OrderCode,
        resolution: PaymentResolution,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();

        let payment = state.payments.get(&order_code).ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentTransactionNotFound,
                format!("no payment transaction for order {}", order_code),
            )
        })?;

        if payment.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal);
        }

        let now = Timestamp::now();
        let donation_id = payment.donation_id;
        let amount = payment.amount.value();

        match resolution {
            PaymentResolution::Succeeded {
                counterparty,
                outbox_event,
            } => {
                let payment = state.payments.get_mut(&order_code).unwrap();
                payment
                    .succeed(counterparty, now)
                    .map_err(DomainError::from)?;

                let campaign_id = state
                    .donations
                    .get(&donation_id)
                    .map(|d| d.campaign_id)
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::DonationNotFound,
                            format!("payment {} has no donation row", order_code),
                        )
                    })?;
                if let Some(campaign) = state.campaigns.get_mut(&campaign_id) {
                    campaign.received_amount += amount;
                    campaign.donation_count += 1;
                }

                Self::append_event(&mut state, outbox_event);
            }
            PaymentResolution::Failed {
                error_code,
                error_description,
                counterparty,
            } => {
                let payment = state.payments.get_mut(&order_code).unwrap();
                payment
                    .fail(error_code, error_description, counterparty, now)
                    .map_err(DomainError::from)?;
            }
        }

        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl CampaignStore for InMemoryStore {
    async fn find_by_id(&self, id: CampaignId) -> Result<Option<Campaign>, DomainError> {
        Ok(self.state.lock().unwrap().campaigns.get(&id).cloned())
    }
}

#[async_trait]
impl OutboxStore for InMemoryStore {
    async fn append(&self, event: NewOutboxEvent) -> Result<OutboxEvent, DomainError> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::append_event(&mut state, event))
    }

    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxEvent>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .outbox
            .iter()
            .filter(|e| e.status == OutboxStatus::Pending)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_processing(&self, id: Uuid) -> Result<(), DomainError> {
        self.update_event(id, |event| {
            event.status = OutboxStatus::Processing;
        })
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), DomainError> {
        self.update_event(id, |event| {
            event.status = OutboxStatus::Completed;
        })
    }

    async fn record_failure(&self, id: Uuid, error: &str, requeue: bool) -> Result<(), DomainError> {
        self.update_event(id, |event| {
            event.retry_count += 1;
            event.last_error = Some(error.to_string());
            event.status = if requeue {
                OutboxStatus::Pending
            } else {
                OutboxStatus::Failed
            };
        })
    }
}

impl InMemoryStore {
    fn update_event(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut OutboxEvent),
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let event = state.outbox.iter_mut().find(|e| e.id == id).ok_or_else(|| {
            DomainError::new(ErrorCode::DatabaseError, format!("outbox event {} missing", id))
        })?;
        update(event);
        event.updated_at = Timestamp::now();
        Ok(())
    }
}

#[async_trait]
impl WalletStore for InMemoryStore {
    async fn find_wallet(
        &self,
        owner_id: UserId,
        kind: WalletKind,
    ) -> Result<Option<Wallet>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .wallets
            .values()
            .find(|w| w.owner_id == owner_id && w.kind == kind)
            .cloned())
    }

    async fn find_entry_by_credit_key(
        &self,
        key: &CreditKey,
    ) -> Result<Option<WalletTransaction>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .ledger
            .iter()
            .find(|entry| entry.credit_key().as_ref() == Some(key))
            .cloned())
    }

    async fn insert_credit(
        &self,
        wallet_id: WalletId,
        credit: NewCredit,
    ) -> Result<InsertOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();

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

        // Unique-index behavior: a lost race converges on the existing row.
        if let Some(key) = entry.credit_key() {
            if let Some(existing) = state
                .ledger
                .iter()
                .find(|e| e.credit_key().as_ref() == Some(&key))
            {
                return Ok(InsertOutcome::Duplicate(existing.clone()));
            }
        }

        let wallet = state.wallets.get_mut(&wallet_id).ok_or_else(|| {
            DomainError::new(ErrorCode::WalletNotFound, format!("wallet {} missing", wallet_id))
        })?;
        wallet.balance += entry.amount;
        wallet.updated_at = Timestamp::now();
        state.ledger.push(entry.clone());

        Ok(InsertOutcome::Inserted(entry))
    }
}

/// Recording notifier for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<DonationNotice>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn notices(&self) -> Vec<DonationNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: DonationNotice) -> Result<(), DomainError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "notifier scripted to fail",
            ));
        }
        self.notices.lock().unwrap().push(notice);
        Ok(())
    }
}

/// Counting cache for assertions in tests.
#[derive(Default)]
pub struct InMemoryCache {
    invalidations: Mutex<Vec<CampaignId>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidations(&self) -> Vec<CampaignId> {
        self.invalidations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CampaignCache for InMemoryCache {
    async fn invalidate(&self, id: CampaignId) -> Result<(), DomainError> {
        self.invalidations.lock().unwrap().push(id);
        Ok(())
    }
}

/// In-memory user directory with seeded donors.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    donors: Mutex<HashMap<String, DonorProfile>>,
    totals: Mutex<HashMap<String, DonorTotals>>,
    awards: Mutex<Vec<(UserId, String)>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a donor reachable by external id.
    pub fn put_donor(&self, external_id: &str, profile: DonorProfile) {
        self.donors
            .lock()
            .unwrap()
            .insert(external_id.to_string(), profile);
    }

    /// Badge awards recorded so far.
    pub fn awards(&self) -> Vec<(UserId, String)> {
        self.awards.lock().unwrap().clone()
    }

    /// Totals recorded for a donor.
    pub fn totals_of(&self, user_id: UserId) -> Option<DonorTotals> {
        self.totals.lock().unwrap().get(&user_id.to_string()).copied()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<DonorProfile>, DomainError> {
        Ok(self
            .donors
            .lock()
            .unwrap()
            .get(external_id.as_str())
            .cloned())
    }

    async fn update_donor_stats(
        &self,
        request: UpdateDonorStats,
    ) -> Result<DonorTotals, DomainError> {
        let mut totals = self.totals.lock().unwrap();
        let entry = totals
            .entry(request.donor_id.to_string())
            .or_insert(DonorTotals {
                total_donated: 0,
                donation_count: 0,
            });
        entry.total_donated += request.amount_to_add;
        entry.donation_count += i64::from(request.increment_count);
        Ok(*entry)
    }

    async fn award_badge(&self, user_id: UserId, badge_id: &str) -> Result<(), DomainError> {
        self.awards
            .lock()
            .unwrap()
            .push((user_id, badge_id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::donation::{CampaignStatus, CounterpartyAccount, PaymentStatus};
    use crate::domain::foundation::Amount;
    use serde_json::json;

    fn seeded_store() -> (InMemoryStore, Campaign, Donation, PaymentTransaction) {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        let campaign = Campaign {
            id: CampaignId::new(),
            title: "Warm Meals".to_string(),
            status: CampaignStatus::Active,
            is_active: true,
            fundraising_start_date: now.minus_days(7),
            fundraising_end_date: now.plus_days(7),
            target_amount: 100_000,
            received_amount: 0,
            donation_count: 0,
        };
        store.put_campaign(campaign.clone());

        let donation = Donation::new(
            campaign.id,
            Amount::new(50_000).unwrap(),
            None,
            None,
            true,
            now,
        );
        let payment = PaymentTransaction::new_pending(
            donation.id,
            OrderCode::from_i64(1700000000000),
            Amount::new(50_000).unwrap(),
            None,
            None,
            None,
            now,
        );
        (store, campaign, donation, payment)
    }

    fn success_resolution() -> PaymentResolution {
        PaymentResolution::Succeeded {
            counterparty: CounterpartyAccount::default(),
            outbox_event: NewOutboxEvent {
                event_type: "DONATION_PAYMENT_SUCCEEDED".to_string(),
                payload: json!({}),
            },
        }
    }

    #[tokio::test]
    async fn resolve_success_updates_payment_stats_and_outbox_atomically() {
        let (store, campaign, donation, payment) = seeded_store();
        store.insert_pending(&donation, &payment).await.unwrap();

        let outcome = store
            .resolve_payment(payment.order_code, success_resolution())
            .await
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::Applied);
        let stored = store
            .find_payment_by_order_code(payment.order_code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Success);

        let campaign = store.campaign(campaign.id).unwrap();
        assert_eq!(campaign.received_amount, 50_000);
        assert_eq!(campaign.donation_count, 1);
        assert_eq!(store.outbox_events().len(), 1);
    }

    #[tokio::test]
    async fn second_resolution_is_already_terminal_with_no_double_stats() {
        let (store, campaign, donation, payment) = seeded_store();
        store.insert_pending(&donation, &payment).await.unwrap();

        store
            .resolve_payment(payment.order_code, success_resolution())
            .await
            .unwrap();
        let outcome = store
            .resolve_payment(payment.order_code, success_resolution())
            .await
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::AlreadyTerminal);
        let campaign = store.campaign(campaign.id).unwrap();
        assert_eq!(campaign.received_amount, 50_000);
        assert_eq!(store.outbox_events().len(), 1);
    }

    #[tokio::test]
    async fn failed_resolution_records_reason_without_stats_or_outbox() {
        let (store, campaign, donation, payment) = seeded_store();
        store.insert_pending(&donation, &payment).await.unwrap();

        store
            .resolve_payment(
                payment.order_code,
                PaymentResolution::Failed {
                    error_code: "AMOUNT_MISMATCH".to_string(),
                    error_description: "expected 50000 but gateway reported 1".to_string(),
                    counterparty: None,
                },
            )
            .await
            .unwrap();

        let stored = store
            .find_payment_by_order_code(payment.order_code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert_eq!(stored.error_code.as_deref(), Some("AMOUNT_MISMATCH"));
        assert_eq!(store.campaign(campaign.id).unwrap().received_amount, 0);
        assert!(store.outbox_events().is_empty());
    }

    #[tokio::test]
    async fn duplicate_order_code_insert_is_rejected() {
        let (store, _campaign, donation, payment) = seeded_store();
        store.insert_pending(&donation, &payment).await.unwrap();

        let result = store.insert_pending(&donation, &payment).await;
        assert!(result.is_err());
    }
}
