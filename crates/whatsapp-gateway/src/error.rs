//! Error types for the WhatsApp gateway client.

use thiserror::Error;

/// Errors that can occur when interacting with the messaging gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (includes request timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the gateway with a provider error code.
    #[error("gateway error {code}: {message}")]
    Api { code: i64, message: String },

    /// Gateway health check failed.
    #[error("Health check failed")]
    HealthCheckFailed,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
