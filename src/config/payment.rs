//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment gateway configuration (PayOS)
#[derive(Clone, Deserialize)]
pub struct PaymentConfig {
    /// Merchant client id
    pub payos_client_id: String,

    /// API key sent on every gateway request
    pub payos_api_key: SecretString,

    /// Checksum key for request signing and webhook verification
    pub payos_checksum_key: SecretString,

    /// Gateway API base URL
    #[serde(default = "default_base_url")]
    pub payos_base_url: String,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.payos_client_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYOS_CLIENT_ID"));
        }
        if self.payos_api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYOS_API_KEY"));
        }
        if self.payos_checksum_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYOS_CHECKSUM_KEY"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("payos_client_id", &self.payos_client_id)
            .field("payos_api_key", &"[REDACTED]")
            .field("payos_checksum_key", &"[REDACTED]")
            .field("payos_base_url", &self.payos_base_url)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api-merchant.payos.vn".to_string()
}
