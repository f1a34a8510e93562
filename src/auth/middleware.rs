// Authentication and role-based authorization middleware for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use crate::auth::{
    claims::{Claims, RoleSet},
    error::AuthError,
    models::AuthenticatedUser,
    store::TokenStore,
    token::{TokenError, TokenService},
};
use crate::roles::models::ADMIN;

/// Everything needed to decide whether a bearer token is acceptable
#[derive(Clone)]
pub struct AuthGuard {
    tokens: Arc<TokenService>,
    store: Arc<dyn TokenStore>,
    strict_sessions: bool,
}

impl AuthGuard {
    /// With `strict_sessions` a token is only accepted while the ledger still
    /// holds a record for it.
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn TokenStore>, strict_sessions: bool) -> Self {
        Self {
            tokens,
            store,
            strict_sessions,
        }
    }

    /// Validate a token for the validation endpoint.
    ///
    /// An identity with no roles at all is refused before `required` is
    /// consulted.
    pub async fn validate(&self, headers: &HeaderMap, required: &RoleSet) -> Result<Claims, AuthError> {
        let claims = authorize(headers, &RoleSet::new(), self).await?;

        if claims.roles.is_empty() {
            warn!("Token for user {} carries no roles", claims.user_id);
            return Err(AuthError::NoRoles);
        }

        check_roles(&claims, required)?;
        Ok(claims)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

fn check_roles(claims: &Claims, required: &RoleSet) -> Result<(), AuthError> {
    if claims.roles.satisfies(required) {
        Ok(())
    } else {
        warn!(
            "Authorization failed: user_id={}, required={}, actual={}",
            claims.user_id, required, claims.roles
        );
        Err(AuthError::InsufficientRole)
    }
}

/// Authenticate the request headers and check the role requirement.
///
/// Expired tokens are removed from the ledger on the way out; a failure to
/// remove one is logged and the request is still refused as expired.
pub async fn authorize(
    headers: &HeaderMap,
    required: &RoleSet,
    guard: &AuthGuard,
) -> Result<Claims, AuthError> {
    let token = bearer_token(headers)?;

    let claims = match guard.tokens.verify(token) {
        Ok(claims) => claims,
        Err(TokenError::Expired { claims }) => {
            warn!("Expired token presented by user {}", claims.user_id);
            if let Err(e) = guard.store.revoke_token(token).await {
                error!("Failed to revoke expired token for user {}: {}", claims.user_id, e);
            }
            return Err(AuthError::Expired);
        }
        Err(TokenError::InvalidSignature) => {
            warn!("Rejected token with invalid signature");
            return Err(AuthError::InvalidSignature);
        }
        Err(e) => {
            error!("Token verification failed: {}", e);
            return Err(AuthError::Internal);
        }
    };

    if guard.strict_sessions {
        match guard.store.find_by_token(token).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!("Revoked token presented by user {}", claims.user_id);
                return Err(AuthError::Revoked);
            }
            Err(e) => {
                error!("Token ledger lookup failed: {}", e);
                return Err(AuthError::Internal);
            }
        }
    }

    check_roles(&claims, required)?;

    debug!("Authorization successful: user_id={}, roles={}", claims.user_id, claims.roles);
    Ok(claims)
}

/// Route-level gate: the caller must hold at least one of `roles`.
/// An empty set admits any authenticated identity.
#[derive(Clone)]
pub struct RequireRoles {
    guard: AuthGuard,
    roles: RoleSet,
}

impl RequireRoles {
    pub fn new(guard: AuthGuard, roles: RoleSet) -> Self {
        Self { guard, roles }
    }

    pub fn any_authenticated(guard: AuthGuard) -> Self {
        Self::new(guard, RoleSet::new())
    }

    /// Create a gate that requires the Admin role
    pub fn admin(guard: AuthGuard) -> Self {
        Self::new(guard, [ADMIN].into_iter().collect())
    }
}

/// Middleware function for `from_fn_with_state`; attaches the caller's
/// identity to the request extensions on success
pub async fn enforce_roles(
    State(rule): State<RequireRoles>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let claims = authorize(request.headers(), &rule.roles, &rule.guard)
        .await
        .map_err(|e| {
            debug!("Request to {} refused: {}", endpoint, e);
            e
        })?;

    request.extensions_mut().insert(AuthenticatedUser::from(claims));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthenticatedUser>().cloned().ok_or_else(|| {
            error!("AuthenticatedUser requested on a route without enforce_roles");
            AuthError::Internal
        })
    }
}
