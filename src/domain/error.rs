//! Error taxonomy for the screening service.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable tag used in error envelopes and logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Database(DatabaseError::NotFound(_)) => "not_found",
            Self::Database(DatabaseError::Timeout(_)) => "timeout",
            Self::Database(_) => "database_error",
            Self::Config(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether this error is the "absent record" outcome rather than a failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Database(DatabaseError::NotFound(_)))
    }
}

/// Caller input errors, always raised before any side effect
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Maximum {max} addresses per batch (got {actual})")]
    BatchTooLarge { max: usize, actual: usize },

    #[error("{0}")]
    Multiple(String),

    /// Body, query string or path that could not be decoded
    #[error("{0}")]
    Malformed(String),
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Screening not found: {0}")]
    NotFound(String),
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
