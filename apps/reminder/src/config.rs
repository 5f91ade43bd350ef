//! Reminder dispatcher configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The WhatsApp destination and API key are NOT environment
//! values - they live in the notification settings record the operator
//! maintains in the store database.

use std::env;
use std::path::PathBuf;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Path to the store's SQLite database file.
    pub database_path: PathBuf,

    /// Timeout for the outbound relay call, in seconds.
    pub relay_timeout_secs: u64,
}

impl ReminderConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ReminderConfig {
            database_path: env::var("RUBIA_DATABASE_PATH")
                .unwrap_or_else(|_| "./rubia.db".to_string())
                .into(),

            relay_timeout_secs: env::var("RUBIA_RELAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("RUBIA_RELAY_TIMEOUT_SECS".to_string()))?,
        };

        if config.relay_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "RUBIA_RELAY_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
