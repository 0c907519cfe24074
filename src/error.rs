//! Error types for BizScope.

use std::time::Duration;

use uuid::Uuid;

use crate::engine::model::SessionStatus;

/// Top-level error type for the intake engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM transport errors. Surfaced to the caller of the enclosing turn —
/// the engine never substitutes a guessed answer for a failed call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("LLM rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Invalid response from LLM: {reason}")]
    InvalidResponse { reason: String },

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM authentication failed")]
    AuthFailed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Profile/proposal extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The model's output did not conform to the closed schema. The
    /// profile is never partially populated — the whole extraction fails.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

/// Session lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Session {id} is {status}, no further turns accepted")]
    NotActive { id: Uuid, status: SessionStatus },

    #[error(
        "Session {id} has {user_messages} user messages, {required} required before proposal generation"
    )]
    NotReady {
        id: Uuid,
        user_messages: usize,
        required: usize,
    },
}

/// Result type alias for the intake engine.
pub type Result<T> = std::result::Result<T, Error>;
