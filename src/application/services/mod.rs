//! Long-running services and shared coordination logic.

mod badge_award;
mod ledger;
mod outbox_processor;
mod queue_consumer;

pub use badge_award::BadgeAwardService;
pub use ledger::WalletLedger;
pub use outbox_processor::{OutboxDispatcher, OutboxEventHandler, OutboxProcessor};
pub use queue_consumer::QueueConsumer;
