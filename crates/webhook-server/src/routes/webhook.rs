//! Inbound webhook route.
//!
//! The gateway delivers inbound messages as form fields and accepts an
//! XML (TwiML-style) reply body. That reply body is the fallback path
//! that still reaches the customer when the gateway send API is the
//! thing that is failing.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Form;
use bot_engine::{apology_text, handle_inbound, InboundMessage, InboundOutcome};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::state::AppState;

/// Inbound message form fields, destination-agnostic names per the
/// gateway's webhook contract.
#[derive(Debug, Deserialize)]
pub struct InboundForm {
    /// Message body text.
    #[serde(rename = "Body", default)]
    pub body: String,
    /// Sender address.
    #[serde(rename = "From")]
    pub from: String,
    /// Recipient address (the bot's number).
    #[serde(rename = "To", default)]
    pub to: String,
    /// Sender display name, if the channel provides one.
    #[serde(rename = "ProfileName")]
    pub profile_name: Option<String>,
}

/// Handle one inbound WhatsApp message.
pub async fn inbound(
    State(state): State<AppState>,
    Form(form): Form<InboundForm>,
) -> Result<Response> {
    let message = InboundMessage {
        body: form.body,
        from: form.from,
        to: form.to,
        profile_name: form.profile_name,
    };

    let outcome = handle_inbound(state.db.pool(), state.sender.as_ref(), &message).await?;

    let response = match outcome {
        // Not for the bot; acknowledge with an empty reply.
        InboundOutcome::NoTrigger => twiml(None),
        InboundOutcome::Replied { contact_id, .. } => {
            info!(contact_id = %contact_id, "Webhook handled");
            twiml(None)
        }
        // Gateway send failed: apologize through the webhook reply body
        // so the conversation never hangs silently.
        InboundOutcome::ReplyFailed { language, error } => {
            warn!(error = %error, "Falling back to webhook apology reply");
            twiml(Some(apology_text(&language)))
        }
    };

    Ok(response)
}

/// Build a TwiML response, optionally carrying a reply message.
fn twiml(message: Option<&str>) -> Response {
    let body = match message {
        Some(text) => format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
            escape_xml(text)
        ),
        None => "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>".to_string(),
    };

    ([(CONTENT_TYPE, "text/xml")], body).into_response()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
