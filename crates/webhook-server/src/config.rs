//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Webhook server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Gateway REST base URL.
    pub gateway_base_url: String,
    /// Gateway account identifier.
    pub gateway_account_sid: String,
    /// Gateway auth token.
    pub gateway_auth_token: String,
    /// Number the bot sends from.
    pub from_number: String,
    /// Scheduler poll interval.
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WEBHOOK_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:tavola.db?mode=rwc` |
    /// | `GATEWAY_BASE_URL` | Gateway REST base URL | `https://api.twilio.com` |
    /// | `GATEWAY_ACCOUNT_SID` | Gateway account identifier | (required) |
    /// | `GATEWAY_AUTH_TOKEN` | Gateway auth token | (required) |
    /// | `WHATSAPP_FROM_NUMBER` | Bot sender number | (required) |
    /// | `POLL_INTERVAL_SECS` | Scheduler poll interval | `60` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("WEBHOOK_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:tavola.db?mode=rwc".to_string());

        let gateway_base_url = env::var("GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.twilio.com".to_string());

        let gateway_account_sid = env::var("GATEWAY_ACCOUNT_SID")
            .map_err(|_| ConfigError::Missing("GATEWAY_ACCOUNT_SID"))?;

        let gateway_auth_token = env::var("GATEWAY_AUTH_TOKEN")
            .map_err(|_| ConfigError::Missing("GATEWAY_AUTH_TOKEN"))?;

        let from_number = env::var("WHATSAPP_FROM_NUMBER")
            .map_err(|_| ConfigError::Missing("WHATSAPP_FROM_NUMBER"))?;

        let poll_interval = env::var("POLL_INTERVAL_SECS")
            .ok()
            .map(|raw| raw.parse().map_err(|_| ConfigError::InvalidPollInterval))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Self {
            addr,
            database_url,
            gateway_base_url,
            gateway_account_sid,
            gateway_auth_token,
            from_number,
            poll_interval,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid WEBHOOK_ADDR format")]
    InvalidAddr,

    #[error("Invalid POLL_INTERVAL_SECS value")]
    InvalidPollInterval,

    #[error("{0} environment variable is required")]
    Missing(&'static str),
}
