//! Donation domain - the donation aggregate and its payment lifecycle.
//!
//! A donation is written together with exactly one payment transaction;
//! the transaction's status is the single source of truth for whether the
//! money actually arrived.

mod badge;
mod campaign;
mod donation;
mod errors;
mod events;
mod payment_transaction;

pub use badge::{BadgeMilestone, MilestoneTable};
pub use campaign::{Campaign, CampaignPhase, CampaignStatus};
pub use donation::Donation;
pub use errors::DonationError;
pub use events::{
    CampaignSurplusDetected, PaymentSucceeded, QueueEvent, EVENT_CAMPAIGN_SURPLUS,
    EVENT_PAYMENT_SUCCEEDED, GATEWAY_TAG,
};
pub use payment_transaction::{CounterpartyAccount, PaymentStatus, PaymentTransaction};
