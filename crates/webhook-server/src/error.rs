//! Error types for the webhook server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur in the webhook server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Conversation pipeline error.
    #[error("Engine error: {0}")]
    Engine(#[from] bot_engine::EngineError),

    /// Scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] scheduler::SchedulerError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Database(database::DatabaseError::NotFound { .. })
            | ServerError::Scheduler(scheduler::SchedulerError::Database(
                database::DatabaseError::NotFound { .. },
            )) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Scheduler(scheduler::SchedulerError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            err => {
                tracing::error!("Request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, ServerError>;
