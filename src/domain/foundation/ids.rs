//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Timestamp, ValidationError};

/// Unique identifier for a donation.
///
/// Uses UUID v7 so identifiers sort by creation time, which keeps
/// donation listings and ledger provenance naturally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(Uuid);

impl DonationId {
    /// Creates a new time-ordered DonationId.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a DonationId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short prefix used in bank transfer descriptions.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for DonationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DonationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentTransactionId(Uuid);

impl PaymentTransactionId {
    /// Creates a new random PaymentTransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PaymentTransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PaymentTransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaymentTransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(Uuid);

impl CampaignId {
    /// Creates a new random CampaignId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a CampaignId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CampaignId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CampaignId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    /// Creates a new random WalletId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a WalletId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal identifier for a user resolved through the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a UserId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identity-provider identifier for a donor (opaque to this service).
///
/// Donations store this reference as issued by the identity provider;
/// resolution to an internal [`UserId`] happens through the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalUserId(String);

impl ExternalUserId {
    /// Creates an ExternalUserId, rejecting empty values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("external_user_id"));
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric correlation key shared with the payment gateway.
///
/// Every payment attempt gets its own order code; the webhook uses it to
/// find the matching payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(i64);

impl OrderCode {
    /// Issues a new order code from the given wall clock reading.
    ///
    /// Millisecond resolution keeps codes unique per attempt at the request
    /// rates this service sees; the database UNIQUE constraint backstops it.
    pub fn issue(now: Timestamp) -> Self {
        Self(now.as_datetime().timestamp_millis())
    }

    /// Creates an OrderCode from a raw value.
    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donation_ids_are_time_ordered() {
        let first = DonationId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = DonationId::new();

        assert!(first.as_uuid().as_bytes() < second.as_uuid().as_bytes());
    }

    #[test]
    fn donation_id_short_is_eight_chars() {
        let id = DonationId::new();
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn donation_id_roundtrips_through_string() {
        let id = DonationId::new();
        let parsed: DonationId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn external_user_id_rejects_empty() {
        assert!(ExternalUserId::new("").is_err());
        assert!(ExternalUserId::new("   ").is_err());
        assert!(ExternalUserId::new("donor-123").is_ok());
    }

    #[test]
    fn order_code_uses_millisecond_clock() {
        let ts = Timestamp::from_unix_secs(1_700_000_000);
        let code = OrderCode::issue(ts);
        assert_eq!(code.value(), 1_700_000_000_000);
    }

    #[test]
    fn order_code_serializes_as_number() {
        let code = OrderCode::from_i64(1234567890123);
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "1234567890123");
    }
}
