//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use dispatcher::MessageSender;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Outbound message sender.
    pub sender: Arc<dyn MessageSender>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, sender: Arc<dyn MessageSender>) -> Self {
        Self { db, sender }
    }
}
