//! Client for the external WhatsApp messaging gateway.
//!
//! The gateway accepts a destination number, a text body, and at most one
//! media URL, and returns a delivery identifier. This crate wraps its REST
//! surface with an explicitly bounded timeout and a uniform error type.
//!
//! # Example
//!
//! ```no_run
//! use whatsapp_gateway::{GatewayConfig, WhatsAppClient};
//!
//! # async fn example() -> Result<(), whatsapp_gateway::GatewayError> {
//! let config = GatewayConfig::new(
//!     "https://api.twilio.com",
//!     "AC_test",
//!     "secret",
//!     "whatsapp:+14155238886",
//! );
//! let client = WhatsAppClient::connect(config).await?;
//!
//! let resp = client.send_text("+393331234567", "Ciao!").await?;
//! println!("delivery id: {}", resp.sid);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;
pub mod window;

pub use client::WhatsAppClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use types::{MessageResponse, SendRequest};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
