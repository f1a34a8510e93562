// Gatekeeper API
// Token authentication, role-based authorization and request-scoped
// notification reporting for a JSON HTTP service

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod memory;
pub mod notifications;
pub mod roles;
pub mod users;
pub mod validation;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{
    enforce_roles, login_handler, validate_token_handler, AuthGuard, AuthService, PasswordService,
    PgTokenStore, RequireRoles, TokenService, TokenStore,
};
use crate::memory::MemoryStore;
use crate::notifications::{finalize_response, handle_panic};
use crate::roles::{assign_role_handler, list_roles_handler, PgRoleRepository, RoleRepository, RoleService};
use crate::users::{
    current_user_handler, find_user_by_email_handler, find_user_by_id_handler, register_user_handler,
    PgUserRepository, UserRepository, UserService,
};

/// Persistence backends the services are built on
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub tokens: Arc<dyn TokenStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenStore::new(pool)),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            roles: Arc::new(store.clone()),
            tokens: Arc::new(store),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub roles: Arc<RoleService>,
    pub guard: AuthGuard,
}

impl AppState {
    pub fn new(stores: Stores, tokens: TokenService, passwords: PasswordService, strict_sessions: bool) -> Self {
        let tokens = Arc::new(tokens);

        Self {
            auth: Arc::new(AuthService::new(
                stores.users.clone(),
                tokens.clone(),
                stores.tokens.clone(),
                passwords.clone(),
            )),
            users: Arc::new(UserService::new(stores.users.clone(), passwords)),
            roles: Arc::new(RoleService::new(stores.roles.clone(), stores.users.clone())),
            guard: AuthGuard::new(tokens, stores.tokens, strict_sessions),
        }
    }
}

async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authenticated = RequireRoles::any_authenticated(state.guard.clone());
    let admin = RequireRoles::admin(state.guard.clone());

    let auth_routes = Router::new()
        .route("/login", post(login_handler))
        .route("/validate_token", get(validate_token_handler));

    let user_routes = Router::new()
        .route("/me", get(current_user_handler))
        .route("/find_user_by_email/:email", get(find_user_by_email_handler))
        .route("/find_user_by_id/:id", get(find_user_by_id_handler))
        .route_layer(from_fn_with_state(authenticated.clone(), enforce_roles))
        .route("/register_user", post(register_user_handler));

    let role_routes = Router::new()
        .route("/assign", post(assign_role_handler))
        .route_layer(from_fn_with_state(admin, enforce_roles))
        .merge(
            Router::new()
                .route("/", get(list_roles_handler))
                .route_layer(from_fn_with_state(authenticated, enforce_roles)),
        );

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/roles", role_routes)
        // The finalizer must wrap every handler and guard so it sees all notifications
        .layer(from_fn(finalize_response))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
