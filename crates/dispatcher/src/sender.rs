//! Message sender trait and implementations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;
use whatsapp_gateway::WhatsAppClient;

use crate::error::DispatchError;

/// Trait for sending messages to a destination number.
///
/// Abstracted to support different transports (WhatsApp gateway, tests).
/// Both methods return the gateway's delivery identifier on success.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text-only message.
    async fn send_text(&self, to: &str, body: &str) -> Result<String, DispatchError>;

    /// Send a message with a single media attachment.
    async fn send_media(
        &self,
        to: &str,
        body: &str,
        media_url: &str,
    ) -> Result<String, DispatchError>;
}

/// Production sender backed by the WhatsApp gateway client.
#[derive(Clone)]
pub struct WhatsAppSender {
    client: WhatsAppClient,
}

impl WhatsAppSender {
    /// Create a sender from a connected gateway client.
    pub fn new(client: WhatsAppClient) -> Self {
        Self { client }
    }

    /// Get the underlying gateway client.
    pub fn client(&self) -> &WhatsAppClient {
        &self.client
    }
}

#[async_trait]
impl MessageSender for WhatsAppSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, DispatchError> {
        info!(to = %to, "Sending text message");
        let resp = self.client.send_text(to, body).await?;
        Ok(resp.sid)
    }

    async fn send_media(
        &self,
        to: &str,
        body: &str,
        media_url: &str,
    ) -> Result<String, DispatchError> {
        info!(to = %to, media_url = %media_url, "Sending media message");
        let resp = self.client.send_media(to, body, media_url).await?;
        Ok(resp.sid)
    }
}

/// A no-op sender that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send_text(&self, _to: &str, _body: &str) -> Result<String, DispatchError> {
        Ok("noop".to_string())
    }

    async fn send_media(
        &self,
        _to: &str,
        _body: &str,
        _media_url: &str,
    ) -> Result<String, DispatchError> {
        Ok("noop".to_string())
    }
}

/// A message captured by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Destination number.
    pub to: String,
    /// Rendered body.
    pub body: String,
    /// Media URL, when the media path was taken.
    pub media_url: Option<String>,
}

/// A sender that records every message, for assertions in tests.
///
/// With `failing`, every send returns an error instead, which exercises
/// the failure paths without a gateway.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Option<String>,
}

impl RecordingSender {
    /// Create a sender that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sender that fails every send with the given error.
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: Some(error.into()),
        }
    }

    /// Messages recorded so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().expect("sender lock poisoned").clone()
    }

    fn record(&self, message: SentMessage) -> Result<String, DispatchError> {
        if let Some(error) = &self.failing {
            return Err(DispatchError::Send(error.clone()));
        }
        let mut sent = self.sent.lock().expect("sender lock poisoned");
        sent.push(message);
        Ok(format!("recorded-{}", sent.len()))
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, DispatchError> {
        self.record(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            media_url: None,
        })
    }

    async fn send_media(
        &self,
        to: &str,
        body: &str,
        media_url: &str,
    ) -> Result<String, DispatchError> {
        self.record(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            media_url: Some(media_url.to_string()),
        })
    }
}
