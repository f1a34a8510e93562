// Role listing and role assignment

use std::sync::Arc;

use tracing::info;

use crate::error::{ApiError, StoreError};
use crate::notifications::messages::{ASSIGN_ROLE_PATH, USER_ALREADY_HAS_ROLE};
use crate::roles::models::{AssignRoleRequest, Role, RoleAssignment};
use crate::roles::repository::RoleRepository;
use crate::users::repository::UserRepository;

/// Service layer for role business logic
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
}

impl RoleService {
    /// Create a new RoleService
    pub fn new(roles: Arc<dyn RoleRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { roles, users }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ApiError> {
        Ok(self.roles.list_roles().await?)
    }

    /// Grant a role to a user.
    ///
    /// Tokens issued before the grant keep their old role snapshot; the new
    /// role is only visible after the user logs in again.
    pub async fn assign_role(&self, request: AssignRoleRequest) -> Result<RoleAssignment, ApiError> {
        if self.users.find_by_id(request.user_id).await?.is_none() {
            return Err(ApiError::NotFound {
                path: ASSIGN_ROLE_PATH,
                entity: "User",
            });
        }

        if self.roles.find_role_by_id(request.role_id).await?.is_none() {
            return Err(ApiError::NotFound {
                path: ASSIGN_ROLE_PATH,
                entity: "Role",
            });
        }

        let already_assigned = || ApiError::Rejected {
            path: ASSIGN_ROLE_PATH,
            message: USER_ALREADY_HAS_ROLE.to_string(),
        };

        if self.roles.has_role(request.user_id, request.role_id).await? {
            return Err(already_assigned());
        }

        let assignment = self
            .roles
            .create_assignment(request.user_id, request.role_id)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => already_assigned(),
                other => other.into(),
            })?;

        info!(
            "Assigned role {} to user {}",
            assignment.role_name, assignment.user_id
        );
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::roles::models::{ADMIN, BOOTSTRAP_ROLES, USER, VISITOR};
    use crate::users::models::NewUser;
    use axum::http::StatusCode;
    use uuid::Uuid;

    async fn setup() -> (RoleService, MemoryStore, Uuid) {
        let store = MemoryStore::with_bootstrap_roles();
        let user = store
            .create_user(NewUser {
                name: "Jane".to_string(),
                email: "jane@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let service = RoleService::new(Arc::new(store.clone()), Arc::new(store.clone()));
        (service, store, user.id)
    }

    #[tokio::test]
    async fn test_roles_are_listed_by_name() {
        let (service, _, _) = setup().await;
        let names: Vec<String> = service
            .list_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec![ADMIN, USER, VISITOR]);
    }

    #[tokio::test]
    async fn test_custom_role_is_listed_and_assignable() {
        let (service, store, user_id) = setup().await;
        let auditor = Role {
            id: Uuid::new_v4(),
            name: "Auditor".to_string(),
            description: Some("Read-only access to audit data".to_string()),
        };
        store.insert_role(auditor.clone()).await;

        let names: Vec<String> = service
            .list_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec![ADMIN, "Auditor", USER, VISITOR]);

        let assignment = service
            .assign_role(AssignRoleRequest { user_id, role_id: auditor.id })
            .await
            .unwrap();
        assert_eq!(assignment.role_name, "Auditor");
        assert!(store.role_names(user_id).await.unwrap().contains("Auditor"));
    }

    #[tokio::test]
    async fn test_assign_role_grants_it() {
        let (service, store, user_id) = setup().await;
        let role = BOOTSTRAP_ROLES[0];

        let assignment = service
            .assign_role(AssignRoleRequest { user_id, role_id: role.id })
            .await
            .unwrap();

        assert_eq!(assignment.role_name, ADMIN);
        assert!(store.role_names(user_id).await.unwrap().contains(ADMIN));
    }

    #[tokio::test]
    async fn test_assigning_twice_is_rejected() {
        let (service, _, user_id) = setup().await;
        let request = AssignRoleRequest {
            user_id,
            role_id: BOOTSTRAP_ROLES[1].id,
        };
        service.assign_role(request.clone()).await.unwrap();

        let err = service.assign_role(request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.notifications()[0].message, USER_ALREADY_HAS_ROLE);
    }

    #[tokio::test]
    async fn test_unknown_user_or_role_is_not_found() {
        let (service, _, user_id) = setup().await;

        let err = service
            .assign_role(AssignRoleRequest {
                user_id: Uuid::new_v4(),
                role_id: BOOTSTRAP_ROLES[0].id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.notifications()[0].message, "User not found");

        let err = service
            .assign_role(AssignRoleRequest {
                user_id,
                role_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.notifications()[0].message, "Role not found");
    }
}
