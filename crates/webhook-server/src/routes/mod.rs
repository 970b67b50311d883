//! Route handlers for the webhook server.

pub mod campaigns;
pub mod health;
pub mod jobs;
pub mod webhook;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Inbound channel
        .route("/webhook/whatsapp", post(webhook::inbound))
        // Health check
        .route("/health", get(health::health))
        // Operational job surface
        .route("/api/jobs/due", get(jobs::due_api))
        .route("/api/jobs/:id", get(jobs::status_api))
        .route("/api/jobs/:id/cancel", post(jobs::cancel_api))
        // Campaign scheduling
        .route("/api/campaigns/schedule", post(campaigns::schedule_api))
        .route("/api/campaigns/:id", delete(campaigns::cancel_api))
}
