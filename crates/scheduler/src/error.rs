//! Error types for the scheduler.

use database::JobStatus;
use thiserror::Error;

/// Errors that can occur in scheduling operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Persistence failure.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Content resolution failure.
    #[error("engine error: {0}")]
    Engine(#[from] bot_engine::EngineError),

    /// A state transition that the job's current status forbids.
    #[error("job {id} cannot transition from status '{status}'", status = .status.as_str())]
    InvalidTransition {
        /// Job id.
        id: String,
        /// Status the job was found in.
        status: JobStatus,
    },
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
