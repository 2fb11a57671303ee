use crate::db::errors::DbError;
use crate::types::EntityKind;
use crate::validation::FieldError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// One or more fields failed validation
    #[error("Validation failed for {} field(s)", errors.len())]
    Validation { errors: Vec<FieldError> },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Store operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl Error {
    /// `NotFound` for a record of `kind`
    pub fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Error::NotFound {
            resource: kind.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::Superseded { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::Validation { errors } => errors
                .iter()
                .map(|e| format!("{} {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, field, .. } => unique_violation_message(table, field),
                DbError::Superseded { .. } => "The record was edited while it was being tested; test it again".to_string(),
                DbError::Other(_) => "Storage error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
            Error::Conflict { message } => message.clone(),
        }
    }
}

fn unique_violation_message(table: &str, field: &str) -> String {
    match (table, field) {
        ("users", "email") => "A user with this email address already exists".to_string(),
        ("models", "id") => "A model with this ID already exists".to_string(),
        _ => "Resource already exists".to_string(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Store constraint error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::BadRequest { .. } | Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            Error::Validation { errors } => {
                let body = json!({
                    "message": "Validation failed",
                    "errors": errors,
                });
                (status, axum::response::Json(body)).into_response()
            }
            Error::Conflict { message } => (status, axum::response::Json(json!({ "message": message }))).into_response(),
            Error::Database(DbError::UniqueViolation { table, field, .. }) => {
                let body = json!({
                    "message": unique_violation_message(table, field),
                    "resource": table,
                    "field": field,
                });
                (status, axum::response::Json(body)).into_response()
            }
            _ => {
                // For all other errors, return simple text message
                let user_message = self.user_message();
                (status, user_message).into_response()
            }
        }
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Validation { errors: vec![] }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Database(DbError::UniqueViolation {
                table: "models",
                field: "id",
                conflicting_value: "gpt-4".to_string(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(DbError::Superseded { table: "connections" }).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = Error::Other(anyhow::anyhow!("lock poisoned at store.rs:42"));
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = Error::Validation {
            errors: vec![FieldError::new("port", "must be a number"), FieldError::new("name", "is required")],
        };
        assert_eq!(err.user_message(), "port must be a number; name is required");
    }
}
