//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Timeout for provider health probe HTTP requests in seconds
    pub health_check_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            health_check_timeout_secs: env::var("HEALTH_CHECK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            health_check_timeout_secs: 5,
        }
    }
}
