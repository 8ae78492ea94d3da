use crate::auth::password::HashError;
use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Errors returned by the account service. Every storage failure is reclassified into one of
/// these variants before it reaches a caller.
#[derive(ThisError, Debug)]
pub enum Error {
    /// A key or required field was zero or empty
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    /// Malformed input, e.g. an empty id list or unknown role
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Requested resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Uniqueness conflict
    #[error("{resource} {id} already exists")]
    AlreadyExists { resource: String, id: String },

    /// A store mutation touched an unexpected number of rows
    #[error("Failed to {operation}: expected {expected} affected row(s), got {actual}")]
    WriteCountMismatch { operation: String, expected: u64, actual: u64 },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    /// Reclassify a storage error. `resource` and `id` describe what was being looked up, for
    /// `NotFound`/`AlreadyExists`; `operation` describes what failed, for internal errors. Raw
    /// store messages are logged here and never become the user-facing text.
    pub fn from_db(err: DbError, operation: &str, resource: &str, id: impl ToString) -> Self {
        match err {
            DbError::MissingRequiredField { field } => Error::MissingRequiredField { field: field.to_string() },
            DbError::InvalidArgument { message } => Error::InvalidArgument { message },
            DbError::NotFound => Error::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            },
            DbError::UniqueViolation { .. } => Error::AlreadyExists {
                resource: resource.to_string(),
                id: id.to_string(),
            },
            DbError::WriteCountMismatch { expected, actual } => Error::WriteCountMismatch {
                operation: operation.to_string(),
                expected,
                actual,
            },
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(operation, %message, "Foreign key violation");
                Error::Internal {
                    operation: operation.to_string(),
                }
            }
            DbError::Other(e) => {
                tracing::error!(operation, "Database error: {:#}", e);
                Error::Internal {
                    operation: operation.to_string(),
                }
            }
        }
    }

    /// Classify a store failure whose cause the caller cannot act on: statement, pool and
    /// transaction errors on reads and writes alike. Row-count mismatches keep their own variant;
    /// everything else is internal.
    pub fn from_store(err: DbError, operation: &str) -> Self {
        match err {
            DbError::WriteCountMismatch { expected, actual } => Error::WriteCountMismatch {
                operation: operation.to_string(),
                expected,
                actual,
            },
            other => {
                tracing::error!(operation, "Store operation failed: {:#}", other);
                Error::Internal {
                    operation: operation.to_string(),
                }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingRequiredField { .. } | Error::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::AlreadyExists { .. } => StatusCode::CONFLICT,
            Error::WriteCountMismatch { .. } | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::WriteCountMismatch { .. } | Error::Internal { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Error::WriteCountMismatch { .. } | Error::Internal { .. })
    }
}

impl From<HashError> for Error {
    fn from(err: HashError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        Error::Internal {
            operation: format!("process password: {err}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::WriteCountMismatch { .. } | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::AlreadyExists { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::MissingRequiredField { .. } | Error::InvalidArgument { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = serde_json::json!({ "message": self.user_message() });
        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
