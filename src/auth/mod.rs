// Authentication module
// JWT issuance and verification, the token ledger and role-based access control

pub mod claims;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use claims::{Claims, RoleSet, TokenSubject};
pub use error::AuthError;
pub use handlers::{login_handler, validate_token_handler};
pub use middleware::{authorize, enforce_roles, AuthGuard, RequireRoles};
pub use models::{AuthResponse, AuthenticatedUser, LoginRequest};
pub use password::PasswordService;
pub use service::AuthService;
pub use store::{PgTokenStore, TokenRecord, TokenStore};
pub use token::TokenService;
