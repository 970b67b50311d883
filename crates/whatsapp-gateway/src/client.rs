//! WhatsApp gateway HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{ApiErrorBody, MessageResponse, SendRequest};

/// Default timeout for gateway calls. Webhook handlers answer within their
/// own SLA, so an unbounded send is a correctness hazard, not just slow.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Channel prefix the gateway expects on both addresses.
const CHANNEL_PREFIX: &str = "whatsapp:";

/// Client for the external WhatsApp messaging gateway.
#[derive(Clone)]
pub struct WhatsAppClient {
    http: Client,
    config: GatewayConfig,
    connected: Arc<AtomicBool>,
}

impl WhatsAppClient {
    /// Create a client with the default timeout.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(config: GatewayConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a client and verify the gateway is reachable.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Self::new(config)?;

        if client.health_check().await? {
            client.connected.store(true, Ordering::SeqCst);
            info!("Connected to WhatsApp gateway at {}", client.config.base_url);
        } else {
            return Err(GatewayError::HealthCheckFailed);
        }

        Ok(client)
    }

    /// Check if the last health check succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Perform a health check against the gateway account resource.
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.account_url();
        debug!("Health check: {}", url);

        match self
            .http
            .get(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await
        {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(GatewayError::Http(e))
            }
        }
    }

    /// Send a message using the full request structure.
    pub async fn send(&self, request: &SendRequest) -> Result<MessageResponse, GatewayError> {
        let to = channel_address(&request.to);
        debug!(to = %to, has_media = request.media_url.is_some(), "Sending message");

        let mut form: Vec<(&str, &str)> = vec![
            ("From", &self.config.from_number),
            ("To", &to),
            ("Body", &request.body),
        ];
        if let Some(media_url) = &request.media_url {
            form.push(("MediaUrl", media_url));
        }

        let resp = self
            .http
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        if resp.status().is_success() {
            let message: MessageResponse = resp.json().await?;
            Ok(message)
        } else {
            let status = resp.status();
            let body: ApiErrorBody = resp.json().await.unwrap_or(ApiErrorBody {
                code: None,
                message: None,
            });
            Err(GatewayError::Api {
                code: body.code.unwrap_or_else(|| i64::from(status.as_u16())),
                message: body
                    .message
                    .unwrap_or_else(|| format!("HTTP {status}")),
            })
        }
    }

    /// Send a text message to a recipient.
    pub async fn send_text(
        &self,
        to: &str,
        body: &str,
    ) -> Result<MessageResponse, GatewayError> {
        self.send(&SendRequest::text(to, body)).await
    }

    /// Send a message with a single media attachment.
    pub async fn send_media(
        &self,
        to: &str,
        body: &str,
        media_url: &str,
    ) -> Result<MessageResponse, GatewayError> {
        self.send(&SendRequest::media(to, body, media_url)).await
    }
}

/// Ensure the channel prefix on a destination address.
fn channel_address(to: &str) -> String {
    if to.starts_with(CHANNEL_PREFIX) {
        to.to_string()
    } else {
        format!("{CHANNEL_PREFIX}{to}")
    }
}
