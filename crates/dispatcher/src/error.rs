//! Error types for the dispatcher.

use thiserror::Error;

/// Errors that can occur while sending a message.
///
/// These never cross the [`deliver`](crate::deliver) boundary; callers of
/// `deliver` receive a [`DeliveryOutcome`](crate::DeliveryOutcome) instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Gateway rejected or failed the send.
    #[error("gateway error: {0}")]
    Gateway(#[from] whatsapp_gateway::GatewayError),

    /// Transport-independent send failure (test senders, future channels).
    #[error("send failed: {0}")]
    Send(String),
}
