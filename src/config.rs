//! Keybeat configuration.

use std::env;
use std::time::Duration;

use crate::KeybeatError;

/// Default base URL for the Keygen API.
pub const DEFAULT_API_URL: &str = "https://api.keygen.sh";

/// Default interval between heartbeat pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for licensing a process against Keygen.
///
/// Built once at startup and passed by reference to every operation.
/// Nothing reads the environment after construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Keygen account ID (UUID format).
    pub account_id: String,

    /// Activation bearer token used for machine-scoped operations.
    pub activation_token: String,

    /// Base URL of the Keygen API, without a trailing slash.
    pub api_url: String,

    /// Interval between heartbeat pings.
    pub heartbeat_interval: Duration,
}

impl Config {
    /// Build a configuration from the process environment.
    ///
    /// Reads `KEYGEN_ACCOUNT_ID` and `KEYGEN_ACTIVATION_TOKEN` (required)
    /// and `KEYGEN_API_URL` (optional).
    ///
    /// # Errors
    /// Returns `Config` errors for missing required variables.
    pub fn from_env() -> Result<Self, KeybeatError> {
        let account_id = env::var("KEYGEN_ACCOUNT_ID")
            .map_err(|_| KeybeatError::Config("KEYGEN_ACCOUNT_ID is not set".to_string()))?;
        let activation_token = env::var("KEYGEN_ACTIVATION_TOKEN")
            .map_err(|_| KeybeatError::Config("KEYGEN_ACTIVATION_TOKEN is not set".to_string()))?;
        let api_url = env::var("KEYGEN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let config = Self {
            account_id,
            activation_token,
            api_url,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), KeybeatError> {
        if self.account_id.is_empty() {
            return Err(KeybeatError::Config(
                "account_id cannot be empty".to_string(),
            ));
        }
        if self.activation_token.is_empty() {
            return Err(KeybeatError::Config(
                "activation_token cannot be empty".to_string(),
            ));
        }
        if self.api_url.is_empty() || self.api_url.ends_with('/') {
            return Err(KeybeatError::Config(format!(
                "api_url must be non-empty without a trailing slash, got {:?}",
                self.api_url
            )));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(KeybeatError::Config(
                "heartbeat_interval cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            account_id: "test-account".to_string(),
            activation_token: "activ-token".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn empty_account_id_rejected() {
        let mut config = test_config();
        config.account_id.clear();
        assert!(matches!(config.validate(), Err(KeybeatError::Config(_))));
    }

    #[test]
    fn empty_token_rejected() {
        let mut config = test_config();
        config.activation_token.clear();
        assert!(matches!(config.validate(), Err(KeybeatError::Config(_))));
    }

    #[test]
    fn trailing_slash_api_url_rejected() {
        let mut config = test_config();
        config.api_url = "https://api.keygen.sh/".to_string();
        assert!(matches!(config.validate(), Err(KeybeatError::Config(_))));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = test_config();
        config.heartbeat_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(KeybeatError::Config(_))));
    }
}
