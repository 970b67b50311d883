//! Configuration types for the WhatsApp gateway client.

/// Configuration for connecting to the messaging gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API
    /// (e.g., "https://api.twilio.com").
    pub base_url: String,
    /// Account identifier used in the resource path and for auth.
    pub account_sid: String,
    /// Auth token for basic authentication.
    pub auth_token: String,
    /// Number the bot sends from (e.g., "whatsapp:+14155238886").
    pub from_number: String,
}

impl GatewayConfig {
    /// Create a new configuration.
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        }
    }

    /// Get the message-send endpoint URL.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }

    /// Get the account resource URL, used as a health check.
    pub fn account_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}.json", self.base_url, self.account_sid)
    }
}
