// Error handling module for the Gatekeeper API
// Every error a handler can return maps to an HTTP status and to the
// notifications reported in the failure envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::{error::AuthError, password::PasswordError, token::TokenError};
use crate::notifications::{
    failure_response,
    messages::{interpolate, ALREADY_EXISTS, INTERNAL_ERROR, INVALID_CREDENTIALS, NOT_FOUND, REQUEST_PATH, SERVER_PATH},
    Notification,
};

/// Persistence failures, shared by every repository implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver or connection failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint rejected the write
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Referenced row does not exist
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl StoreError {
    /// Classify a sqlx error, recognising unique and foreign key violations
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Main error type for the API
/// All handlers return Result<T, ApiError>
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown email or wrong password; the two are indistinguishable to callers
    #[error("invalid credentials")]
    InvalidCredentials { path: &'static str },

    #[error("{entity} not found")]
    NotFound { path: &'static str, entity: &'static str },

    #[error("{entity} with this {field} already exists")]
    AlreadyExists {
        path: &'static str,
        entity: &'static str,
        field: &'static str,
    },

    /// Business rule rejection with a ready-made message
    #[error("{message}")]
    Rejected { path: &'static str, message: String },

    /// Field-level failures have already been posted to the request collector
    #[error("validation failed")]
    ValidationFailed,

    /// Request body could not be parsed
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists { .. } => StatusCode::CONFLICT,
            ApiError::Rejected { .. } => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed => StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(auth) => auth.status_code(),
            ApiError::Store(_)
            | ApiError::Password(_)
            | ApiError::Token(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Notifications describing this error, safe to send to clients
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            ApiError::InvalidCredentials { path } => {
                vec![Notification::new(*path, INVALID_CREDENTIALS)]
            }
            ApiError::NotFound { path, entity } => {
                vec![Notification::new(*path, interpolate(NOT_FOUND, &[*entity]))]
            }
            ApiError::AlreadyExists { path, entity, field } => vec![Notification::new(
                *path,
                interpolate(ALREADY_EXISTS, &[*entity, *field]),
            )],
            ApiError::Rejected { path, message } => vec![Notification::new(*path, message.clone())],
            ApiError::ValidationFailed => Vec::new(),
            ApiError::MalformedBody(msg) => vec![Notification::new(REQUEST_PATH, msg.clone())],
            ApiError::Auth(auth) => auth.notifications(),
            ApiError::Store(_)
            | ApiError::Password(_)
            | ApiError::Token(_)
            | ApiError::Internal(_) => vec![Notification::new(SERVER_PATH, INTERNAL_ERROR)],
        }
    }

    fn log(&self) {
        match self {
            ApiError::InvalidCredentials { path } => warn!("Invalid credentials at {}", path),
            ApiError::NotFound { path, entity } => debug!("{} not found at {}", entity, path),
            ApiError::AlreadyExists { path, entity, field } => {
                warn!("Conflict at {}: {} with this {} already exists", path, entity, field)
            }
            ApiError::Rejected { path, message } => debug!("Rejected at {}: {}", path, message),
            ApiError::ValidationFailed => debug!("Request validation failed"),
            ApiError::MalformedBody(msg) => debug!("Malformed request body: {}", msg),
            // Auth errors log themselves when they are raised
            ApiError::Auth(_) => {}
            ApiError::Store(e) => error!("Store error: {}", e),
            ApiError::Password(e) => error!("Password error: {}", e),
            ApiError::Token(e) => error!("Token error: {}", e),
            ApiError::Internal(msg) => error!("Internal error: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        failure_response(self.status_code(), self.notifications())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_error_class() {
        assert_eq!(
            ApiError::InvalidCredentials { path: "/login" }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound { path: "/x", entity: "User" }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Auth(AuthError::InsufficientRole).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = ApiError::Internal("connection string postgres://secret".into());
        let notes = err.notifications();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, INTERNAL_ERROR);
    }

    #[test]
    fn test_messages_are_interpolated() {
        let err = ApiError::AlreadyExists {
            path: "/register_user",
            entity: "User",
            field: "email",
        };
        assert_eq!(err.notifications()[0].message, "User with this email already exists");

        let err = ApiError::NotFound { path: "/assign_role", entity: "Role" };
        assert_eq!(err.notifications()[0].message, "Role not found");
    }

    #[test]
    fn test_store_error_conflict_maps_to_500_unless_handled() {
        let err: ApiError = StoreError::Conflict("dup".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
