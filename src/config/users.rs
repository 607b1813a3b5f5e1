//! User service configuration

use serde::Deserialize;

use super::error::ValidationError;

/// User service RPC endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// Base URL of the user service internal API
    pub base_url: String,
}

impl UsersConfig {
    /// Validate user service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("USERS_BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUsersUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_url_passes_validation() {
        let config = UsersConfig {
            base_url: "https://users.internal".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bare_host_fails_validation() {
        let config = UsersConfig {
            base_url: "users.internal".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
