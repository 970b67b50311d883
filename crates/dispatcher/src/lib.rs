//! Outbound delivery dispatcher for the Tavola WhatsApp bot.
//!
//! This crate turns resolved content into a gateway send: it substitutes
//! template variables, appends the CTA suffix, picks the media or text
//! path, and reports a uniform [`DeliveryOutcome`]. Gateway failures are
//! data, never panics or errors past [`deliver`] — callers decide what a
//! failed send means for them.
//!
//! # Example
//!
//! ```no_run
//! use dispatcher::{deliver, NoOpSender, OutboundContent, TemplateVars};
//!
//! # async fn example() {
//! let sender = NoOpSender;
//! let content = OutboundContent::text("Hi {{customerName}}!");
//! let vars = TemplateVars::new("Marco", "Trattoria da Anna");
//!
//! let outcome = deliver(&sender, "+393331234567", &content, &vars).await;
//! assert!(outcome.is_sent());
//! # }
//! ```

mod content;
mod error;
mod sender;

pub use content::{
    body_with_cta, render_body, substitute, OutboundContent, TemplateVars,
    CUSTOMER_NAME_PLACEHOLDER, RESTAURANT_NAME_PLACEHOLDER,
};
pub use error::DispatchError;
pub use sender::{MessageSender, NoOpSender, RecordingSender, SentMessage, WhatsAppSender};

use tracing::warn;

/// Result of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The gateway accepted the message.
    Sent {
        /// Gateway delivery identifier.
        delivery_id: String,
    },
    /// The send was rejected or timed out.
    Failed {
        /// Human-readable error, for the job record and the logs.
        error: String,
    },
}

impl DeliveryOutcome {
    /// Whether the message was accepted.
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }

    /// Delivery identifier, if the message was accepted.
    pub fn delivery_id(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Sent { delivery_id } => Some(delivery_id),
            DeliveryOutcome::Failed { .. } => None,
        }
    }

    /// Error text, if the send failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Sent { .. } => None,
            DeliveryOutcome::Failed { error } => Some(error),
        }
    }
}

/// Render and send resolved content to a destination.
///
/// Chooses the media path when the content carries a media URL, the text
/// path otherwise. Never returns an error: failures come back as
/// [`DeliveryOutcome::Failed`].
pub async fn deliver(
    sender: &dyn MessageSender,
    to: &str,
    content: &OutboundContent,
    vars: &TemplateVars,
) -> DeliveryOutcome {
    let body = render_body(content, vars);

    let result = match &content.media_url {
        Some(media_url) => sender.send_media(to, &body, media_url).await,
        None => sender.send_text(to, &body).await,
    };

    match result {
        Ok(delivery_id) => DeliveryOutcome::Sent { delivery_id },
        Err(e) => {
            warn!(to = %to, error = %e, "Delivery failed");
            DeliveryOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_takes_media_path() {
        let sender = RecordingSender::new();
        let content = OutboundContent {
            body: "Menu for {{customerName}}".to_string(),
            media_url: Some("https://cdn.example.com/menu.pdf".to_string()),
            cta_url: None,
            cta_text: None,
        };
        let vars = TemplateVars::new("Marco", "Anna");

        let outcome = deliver(&sender, "+393331234567", &content, &vars).await;
        assert!(outcome.is_sent());

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "Menu for Marco");
        assert_eq!(
            sent[0].media_url.as_deref(),
            Some("https://cdn.example.com/menu.pdf")
        );
    }

    #[tokio::test]
    async fn test_deliver_takes_text_path() {
        let sender = RecordingSender::new();
        let content = OutboundContent::text("Hi {{customerName}}");
        let vars = TemplateVars::new("Marco", "Anna");

        let outcome = deliver(&sender, "+393331234567", &content, &vars).await;
        assert!(outcome.is_sent());

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].media_url.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_outcome_not_error() {
        let sender = RecordingSender::failing("gateway down");
        let content = OutboundContent::text("Hi");
        let vars = TemplateVars::new("Marco", "Anna");

        let outcome = deliver(&sender, "+393331234567", &content, &vars).await;
        assert!(!outcome.is_sent());
        assert!(outcome.error().unwrap().contains("gateway down"));
    }
}
