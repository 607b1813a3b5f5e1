//! Wallet domain - balances and the append-only ledger.

mod transaction;
mod wallet;

pub use transaction::{CreditKey, TransactionType, WalletTransaction};
pub use wallet::{Wallet, WalletKind};
