// HTTP handlers for authentication endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::auth::{
    claims::RoleSet,
    models::{AuthResponse, LoginRequest, TokenValidation, ValidateTokenQuery},
};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::notifications::NotificationCollector;
use crate::AppState;

/// Login a user
/// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    notes: NotificationCollector,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    Ok(Json(state.auth.login(&notes, request).await?))
}

/// Check a bearer token, optionally against a comma separated role list
/// GET /api/auth/validate_token?roles=Admin,User
pub async fn validate_token_handler(
    State(state): State<AppState>,
    Query(query): Query<ValidateTokenQuery>,
    headers: HeaderMap,
) -> Result<Json<TokenValidation>, ApiError> {
    let required = query
        .roles
        .as_deref()
        .map(RoleSet::parse_list)
        .unwrap_or_default();

    let claims = state.guard.validate(&headers, &required).await?;

    Ok(Json(TokenValidation {
        valid: true,
        user: claims.into(),
    }))
}
