use crate::api::models::response::ApiResponse;
use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or invalid request data, or a business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// The write collides with existing state (double booking, stale version)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Wrap a repository error, naming the resource when its row was missing.
    pub fn from_db(err: DbError, resource: &str, id: impl ToString) -> Self {
        match err {
            DbError::NotFound => Error::not_found(resource, id),
            other => Error::Database(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ProtectedEntity { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation {
                    constraint,
                    conflicting_value,
                    ..
                } => {
                    let value = conflicting_value.as_deref().unwrap_or("value");
                    match constraint.as_deref() {
                        Some("sections_branch_name_unique") => format!("A section named '{value}' already exists"),
                        Some("tables_branch_number_unique") => format!("Table number '{value}' is already in use"),
                        Some("table_categories_branch_name_unique") => format!("A table category named '{value}' already exists"),
                        Some("branches_slug_key") => format!("A branch with slug '{value}' already exists"),
                        _ => "Resource already exists".to_string(),
                    }
                }
                DbError::ForeignKeyViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) if c.contains("section_id") => "Referenced section does not exist".to_string(),
                    Some(c) if c.contains("category_id") => "Referenced table category does not exist".to_string(),
                    Some(c) if c.contains("table_id") => "Referenced table does not exist".to_string(),
                    _ => "Invalid reference to related resource".to_string(),
                },
                DbError::CheckViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) => format!("Invalid data provided ({c})"),
                    None => "Invalid data provided".to_string(),
                },
                DbError::ProtectedEntity {
                    operation,
                    entity_type,
                    reason,
                    ..
                } => format!("Cannot {operation} {entity_type}: {reason}"),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
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
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, ApiResponse::<()>::failure(self.user_message())).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Convert from sqlx errors raised while acquiring connections or committing
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.into())
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
