// HTTP handlers for role endpoints

use axum::{extract::State, http::StatusCode, Json};
use tracing::debug;

use crate::auth::models::AuthenticatedUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::roles::models::{AssignRoleRequest, Role, RoleAssignment};
use crate::AppState;

/// GET /api/roles
pub async fn list_roles_handler(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.roles.list_roles().await?))
}

/// Grant a role to a user; Admin only
/// POST /api/roles/assign
pub async fn assign_role_handler(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    ApiJson(request): ApiJson<AssignRoleRequest>,
) -> Result<(StatusCode, Json<RoleAssignment>), ApiError> {
    debug!(
        "Admin {} assigning role {} to user {}",
        admin.id, request.role_id, request.user_id
    );
    let assignment = state.roles.assign_role(request).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}
