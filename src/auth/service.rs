// Authentication service: credential checks and token issuance

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::auth::{
    claims::TokenSubject,
    models::{AuthResponse, LoginRequest, LoginUser},
    password::PasswordService,
    store::TokenStore,
    token::TokenService,
};
use crate::error::ApiError;
use crate::notifications::{field_issues, messages::LOGIN_PATH, NotificationCollector};
use crate::users::repository::UserRepository;

/// Authentication service for login
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    store: Arc<dyn TokenStore>,
    passwords: PasswordService,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        store: Arc<dyn TokenStore>,
        passwords: PasswordService,
    ) -> Self {
        Self {
            users,
            tokens,
            store,
            passwords,
        }
    }

    /// Authenticate an identity and issue a token carrying its current roles.
    ///
    /// The new token replaces any earlier token for the same identity. Unknown
    /// emails and wrong passwords produce the same failure, 401 "Invalid
    /// credentials", and neither touches the ledger. This differs from the user
    /// lookups, where a missing email is reported as 404 "User not found".
    pub async fn login(
        &self,
        notes: &NotificationCollector,
        request: LoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        if let Err(errors) = request.validate() {
            notes.add_validation_failures(LOGIN_PATH, field_issues(&errors));
            return Err(ApiError::ValidationFailed);
        }

        let invalid = ApiError::InvalidCredentials { path: LOGIN_PATH };

        let Some(user) = self.users.find_by_email(&request.email).await? else {
            warn!("Login attempt for unknown email");
            return Err(invalid);
        };

        if !self.passwords.verify(&request.password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(invalid);
        }

        let roles = self.users.role_names(user.id).await?;
        let issued = self.tokens.issue(&TokenSubject {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles,
        })?;

        self.store
            .persist(user.id, &issued.token, issued.expires_at)
            .await?;

        info!("User {} logged in", user.id);
        Ok(AuthResponse {
            user: LoginUser {
                id: user.id,
                email: user.email,
                name: user.name,
            },
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}
