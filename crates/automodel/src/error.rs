//! Error types for automodel

use thiserror::Error;

/// Result type for automodel operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error type for automodel introspection and classification.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Database error from tokio-postgres.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    /// Validation error (e.g., empty schema, unknown table).
    #[error("Validation error: {0}")]
    Validation(String),
    /// Decode error when reading a column.
    #[error("Decode error for column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl SchemaError {
    /// Create a decode error.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}
