use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::roles::models::{Role, RoleAssignment};

/// Storage for roles and their assignment to users
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles ordered by name
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError>;

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, StoreError>;

    /// Fails with `StoreError::Conflict` when the user already holds the role
    async fn create_assignment(&self, user_id: Uuid, role_id: Uuid) -> Result<RoleAssignment, StoreError>;
}

/// Repository for database operations on roles
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    /// Create a new PgRoleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_assignment(&self, user_id: Uuid, role_id: Uuid) -> Result<RoleAssignment, StoreError> {
        let assignment = sqlx::query_as::<_, RoleAssignment>(
            r#"
            WITH inserted AS (
                INSERT INTO user_roles (user_id, role_id)
                VALUES ($1, $2)
                RETURNING user_id, role_id, assigned_at
            )
            SELECT inserted.user_id, inserted.role_id, roles.name AS role_name, inserted.assigned_at
            FROM inserted
            JOIN roles ON roles.id = inserted.role_id
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(assignment)
    }
}
