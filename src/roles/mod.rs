// Roles module
// Role catalogue and role assignment

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::{assign_role_handler, list_roles_handler};
pub use models::{AssignRoleRequest, Role, RoleAssignment, ADMIN, BOOTSTRAP_ROLES, USER, VISITOR};
pub use repository::{PgRoleRepository, RoleRepository};
pub use service::RoleService;
