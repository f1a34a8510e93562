// Notification paths and message templates shared by every module

pub const AUTH_PATH: &str = "auth";
pub const LOGIN_PATH: &str = "/login";
pub const VALIDATE_TOKEN_PATH: &str = "/validate_token";
pub const REGISTER_USER_PATH: &str = "/register_user";
pub const FIND_USER_BY_EMAIL_PATH: &str = "/find_user_by_email";
pub const FIND_USER_BY_ID_PATH: &str = "/find_user_by_id";
pub const CURRENT_USER_PATH: &str = "/current_user";
pub const ASSIGN_ROLE_PATH: &str = "/assign_role";
pub const REQUEST_PATH: &str = "request";
pub const SERVER_PATH: &str = "server";

pub const NOT_FOUND: &str = "{0} not found";
pub const ALREADY_EXISTS: &str = "{0} with this {1} already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const USER_ALREADY_HAS_ROLE: &str = "User already has this role";
pub const INTERNAL_ERROR: &str = "An unexpected internal server error occurred.";

/// Fill `{0}`, `{1}`, ... placeholders in order. Unused placeholders stay as-is.
pub fn interpolate(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |acc, (i, arg)| {
            acc.replacen(&format!("{{{}}}", i), arg, 1)
        })
}
