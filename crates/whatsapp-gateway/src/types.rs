//! Types for sending messages through the gateway.

use serde::Deserialize;

/// Parameters for sending a message.
#[derive(Debug, Clone)]
pub struct SendRequest {
    /// Destination phone number, with or without the channel prefix.
    pub to: String,
    /// The message text.
    pub body: String,
    /// Media attachment URL. The channel accepts at most one.
    pub media_url: Option<String>,
}

impl SendRequest {
    /// Create send params for a text-only message.
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: body.into(),
            media_url: None,
        }
    }

    /// Create send params for a message with a media attachment.
    pub fn media(
        to: impl Into<String>,
        body: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            body: body.into(),
            media_url: Some(media_url.into()),
        }
    }
}

/// Successful send response from the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    /// Delivery identifier (e.g., "SM..." message SID).
    pub sid: String,
    /// Queueing status reported by the gateway.
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned by the gateway on a failed request.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Provider-specific error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable error message.
    #[serde(default)]
    pub message: Option<String>,
}
