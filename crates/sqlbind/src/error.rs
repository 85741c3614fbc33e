//! Error types for sqlbind

use thiserror::Error;

/// Result type alias for sqlbind operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for statement construction, execution and row binding.
///
/// [`SqlError::Build`] is the only caller/configuration error: it is returned
/// by `build()` when the assembler is missing something it needs. Every other
/// variant is a runtime condition surfaced while executing or binding.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Statement configuration error (missing table, arity mismatch, ...)
    #[error("Build error: {0}")]
    Build(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error reported by the client
    #[error("Query error: {0}")]
    Query(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create a build (configuration) error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a build (configuration) error
    pub fn is_build_error(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a row decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for SqlError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        match err.as_db_error() {
            Some(db_err) => Self::Query(format!("{}: {}", db_err.code().code(), db_err.message())),
            None => Self::Query(err.to_string()),
        }
    }
}
