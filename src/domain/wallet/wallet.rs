//! Wallet entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId, WalletId};

/// What a wallet is for. One wallet per (owner, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// Day-to-day funds of a user or organization.
    Operating,
    /// Platform-administered wallet that receives confirmed donations.
    Admin,
}

impl WalletKind {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Operating => "operating",
            WalletKind::Admin => "admin",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "operating" => Some(WalletKind::Operating),
            "admin" => Some(WalletKind::Admin),
            _ => None,
        }
    }
}

/// A balance holder. The balance only moves inside the same transaction as
/// a ledger entry insert; it is never set to an absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner_id: UserId,
    pub kind: WalletKind,
    pub balance: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Wallet {
    /// Creates an empty wallet for an owner.
    pub fn new(owner_id: UserId, kind: WalletKind, now: Timestamp) -> Self {
        Self {
            id: WalletId::new(),
            owner_id,
            kind,
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn new_wallet_starts_empty() {
        let owner = UserId::from_uuid(Uuid::new_v4());
        let wallet = Wallet::new(owner, WalletKind::Admin, Timestamp::now());
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.kind, WalletKind::Admin);
    }

    #[test]
    fn wallet_kind_roundtrips_through_storage_form() {
        for kind in [WalletKind::Operating, WalletKind::Admin] {
            assert_eq!(WalletKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(WalletKind::parse("escrow"), None);
    }
}
