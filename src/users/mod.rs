// Users module
// Registration and identity lookup

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::{current_user_handler, find_user_by_email_handler, find_user_by_id_handler, register_user_handler};
pub use models::{NewUser, PublicUser, RegisterUserRequest, User};
pub use repository::{PgUserRepository, UserRepository};
pub use service::UserService;
