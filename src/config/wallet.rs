//! Platform wallet configuration

use serde::Deserialize;
use uuid::Uuid;

use super::error::ValidationError;
use crate::domain::foundation::UserId;

/// Which wallet receives confirmed donations.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Owner id of the platform-administered wallet
    pub admin_owner_id: Uuid,
}

impl WalletConfig {
    /// Admin wallet owner as a domain id.
    pub fn admin_owner(&self) -> UserId {
        UserId::from_uuid(self.admin_owner_id)
    }

    /// Validate wallet configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.admin_owner_id.is_nil() {
            return Err(ValidationError::InvalidAdminOwner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_owner_fails_validation() {
        let config = WalletConfig {
            admin_owner_id: Uuid::nil(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn real_owner_passes_validation() {
        let config = WalletConfig {
            admin_owner_id: Uuid::new_v4(),
        };
        assert!(config.validate().is_ok());
    }
}
