//! Conversation pipeline for the Tavola WhatsApp bot.
//!
//! This crate turns an arbitrary inbound text message into a
//! deterministic outbound response:
//!
//! - [`triggers`] — case-insensitive exact matching against active
//!   trigger phrases;
//! - [`language`] — pure phone-number → language classification;
//! - [`contacts`] — find-or-create registry keyed by hashed phone;
//! - [`resolver`] — the three-tier content cascade (current system →
//!   legacy templates → generic fallback) that never comes back empty;
//! - [`flow`] — the webhook flow wiring them together and scheduling the
//!   delayed review follow-up.

pub mod contacts;
pub mod error;
pub mod flow;
pub mod language;
pub mod resolver;
pub mod triggers;

pub use error::{EngineError, Result};
pub use flow::{apology_text, handle_inbound, InboundMessage, InboundOutcome};
pub use resolver::{resolve_message, Resolved, ResolutionTier};
