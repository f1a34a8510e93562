// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::notifications::{failure_response, messages::AUTH_PATH, Notification};

/// Authentication and authorization failures.
///
/// The display text is exactly what the client sees; internal detail is
/// logged where the error is raised and never carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Invalid token format. Use: Bearer <token>")]
    MalformedHeader,

    #[error("Token is missing")]
    MissingToken,

    #[error("Invalid token")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    /// Signature and expiry are fine but the ledger no longer holds the token
    #[error("Token has been revoked")]
    Revoked,

    #[error("User does not have the required role")]
    InsufficientRole,

    #[error("User does not have any roles")]
    NoRoles,

    #[error("Internal server error during authentication")]
    Internal,
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        vec![Notification::new(AUTH_PATH, self.to_string())]
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        failure_response(self.status_code(), self.notifications())
    }
}
