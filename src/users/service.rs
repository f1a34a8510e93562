// User registration and lookup

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::PasswordService;
use crate::error::{ApiError, StoreError};
use crate::notifications::{
    field_issues,
    messages::{CURRENT_USER_PATH, FIND_USER_BY_EMAIL_PATH, FIND_USER_BY_ID_PATH, REGISTER_USER_PATH},
    NotificationCollector,
};
use crate::users::models::{NewUser, PublicUser, RegisterUserRequest};
use crate::users::repository::UserRepository;

/// Service layer for user business logic
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    passwords: PasswordService,
}

impl UserService {
    /// Create a new UserService
    pub fn new(users: Arc<dyn UserRepository>, passwords: PasswordService) -> Self {
        Self { users, passwords }
    }

    /// Register a new identity with a hashed password and no roles
    pub async fn register(
        &self,
        notes: &NotificationCollector,
        request: RegisterUserRequest,
    ) -> Result<PublicUser, ApiError> {
        if let Err(errors) = request.validate() {
            notes.add_validation_failures(REGISTER_USER_PATH, field_issues(&errors));
            return Err(ApiError::ValidationFailed);
        }

        let already_exists = || ApiError::AlreadyExists {
            path: REGISTER_USER_PATH,
            entity: "User",
            field: "email",
        };

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(already_exists());
        }

        let password_hash = self.passwords.hash(&request.password)?;
        let user = self
            .users
            .create_user(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                StoreError::Conflict(_) => already_exists(),
                other => other.into(),
            })?;

        info!("Registered user {}", user.id);
        Ok(user.into())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<PublicUser, ApiError> {
        self.users
            .find_by_email(email)
            .await?
            .map(PublicUser::from)
            .ok_or(ApiError::NotFound {
                path: FIND_USER_BY_EMAIL_PATH,
                entity: "User",
            })
    }

    /// Identifiers that are not UUIDs cannot name a user and are reported as not found
    pub async fn find_by_id(&self, id: &str) -> Result<PublicUser, ApiError> {
        let not_found = ApiError::NotFound {
            path: FIND_USER_BY_ID_PATH,
            entity: "User",
        };
        let Ok(id) = Uuid::parse_str(id) else {
            return Err(not_found);
        };

        self.users
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(not_found)
    }

    pub async fn current_user(&self, id: Uuid) -> Result<PublicUser, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(ApiError::NotFound {
                path: CURRENT_USER_PATH,
                entity: "User",
            })
    }
}
