// HTTP handlers for user endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::models::AuthenticatedUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::notifications::NotificationCollector;
use crate::users::models::{PublicUser, RegisterUserRequest};
use crate::AppState;

/// Register a new user
/// POST /api/users/register_user
pub async fn register_user_handler(
    State(state): State<AppState>,
    notes: NotificationCollector,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = state.users.register(&notes, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Profile of the authenticated caller
/// GET /api/users/me
pub async fn current_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.users.current_user(user.id).await?))
}

/// GET /api/users/find_user_by_email/{email}
pub async fn find_user_by_email_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.users.find_by_email(&email).await?))
}

/// GET /api/users/find_user_by_id/{id}
pub async fn find_user_by_id_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.users.find_by_id(&id).await?))
}
