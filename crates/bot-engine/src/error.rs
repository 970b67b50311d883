//! Error types for the bot engine.

use thiserror::Error;

/// Errors that can occur in the conversation pipeline.
///
/// Resolution misses are not errors: an unmatched trigger and an empty
/// cascade tier are normal outcomes expressed in return values.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Persistence failure.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
