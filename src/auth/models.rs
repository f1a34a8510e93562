// Authentication request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::claims::{Claims, RoleSet};

/// Login request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Identity summary returned on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Authentication response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: LoginUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity attached to a request once its token has been accepted.
///
/// Role names are the snapshot taken when the token was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: RoleSet,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

/// Query string for the token validation endpoint: `?roles=Admin,User`
#[derive(Debug, Default, Deserialize)]
pub struct ValidateTokenQuery {
    pub roles: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    pub user: AuthenticatedUser,
}
