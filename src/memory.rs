// In-process storage used when no database is configured, and by the tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::claims::RoleSet;
use crate::auth::store::{hash_token, TokenRecord, TokenStore};
use crate::error::StoreError;
use crate::roles::models::{Role, RoleAssignment, BOOTSTRAP_ROLES};
use crate::roles::repository::RoleRepository;
use crate::users::models::{NewUser, User};
use crate::users::repository::UserRepository;

#[derive(Debug, Clone)]
struct Grant {
    user_id: Uuid,
    role_id: Uuid,
    assigned_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    grants: Vec<Grant>,
    tokens: Vec<TokenRecord>,
}

/// Users, roles and the token ledger behind a single lock.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the Admin, User and Visitor roles
    pub fn with_bootstrap_roles() -> Self {
        let mut state = MemoryState::default();
        for role in BOOTSTRAP_ROLES {
            state.roles.insert(role.id, Role::from(role));
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Add a role beyond the bootstrap set
    pub async fn insert_role(&self, role: Role) {
        self.state.write().await.roles.insert(role.id, role);
    }

    /// Ledger records held for one identity
    pub async fn token_records_for(&self, user_id: Uuid) -> Vec<TokenRecord> {
        self.state
            .read()
            .await
            .tokens
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn persist(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError> {
        let record = TokenRecord {
            user_id,
            token_hash: hash_token(token),
            expires_at,
            created_at: Utc::now(),
        };

        // Remove and insert under one write lock
        let mut state = self.state.write().await;
        state.tokens.retain(|existing| existing.user_id != user_id);
        state.tokens.push(record.clone());

        Ok(record)
    }

    async fn revoke_all_for_identity(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|record| record.user_id != user_id);
        Ok((before - state.tokens.len()) as u64)
    }

    async fn revoke_token(&self, token: &str) -> Result<bool, StoreError> {
        let token_hash = hash_token(token);
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|record| record.token_hash != token_hash);
        Ok(state.tokens.len() < before)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.tokens.iter().find(|record| record.matches(token)).cloned())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|record| record.expires_at > now);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        let taken = state
            .users
            .values()
            .any(|user| user.email.eq_ignore_ascii_case(&new_user.email));
        if taken {
            return Err(StoreError::Conflict(format!("email {}", new_user.email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn role_names(&self, user_id: Uuid) -> Result<RoleSet, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|grant| grant.user_id == user_id)
            .filter_map(|grant| state.roles.get(&grant.role_id))
            .map(|role| role.name.clone())
            .collect())
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let mut roles: Vec<Role> = self.state.read().await.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        Ok(self.state.read().await.roles.get(&id).cloned())
    }

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .any(|grant| grant.user_id == user_id && grant.role_id == role_id))
    }

    async fn create_assignment(&self, user_id: Uuid, role_id: Uuid) -> Result<RoleAssignment, StoreError> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference(format!("user {}", user_id)));
        }
        let role_name = state
            .roles
            .get(&role_id)
            .map(|role| role.name.clone())
            .ok_or_else(|| StoreError::MissingReference(format!("role {}", role_id)))?;

        if state
            .grants
            .iter()
            .any(|grant| grant.user_id == user_id && grant.role_id == role_id)
        {
            return Err(StoreError::Conflict(format!("user {} already has role {}", user_id, role_id)));
        }

        let grant = Grant {
            user_id,
            role_id,
            assigned_at: Utc::now(),
        };
        state.grants.push(grant.clone());

        Ok(RoleAssignment {
            user_id: grant.user_id,
            role_id: grant.role_id,
            role_name,
            assigned_at: grant.assigned_at,
        })
    }
}
