use thiserror::Error;

/// Unified error type for store operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation on {table}.{field}")]
    UniqueViolation {
        table: &'static str,
        field: &'static str,
        /// The conflicting value that caused the violation
        conflicting_value: String,
    },

    /// The record changed while an operation that read it was in flight
    #[error("{table} record changed concurrently")]
    Superseded { table: &'static str },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type alias for store operation results
pub type Result<T> = std::result::Result<T, DbError>;
