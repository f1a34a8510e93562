// Validation utilities module
// Custom rules used by the request DTOs

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

pub const PASSWORD_COMPLEXITY_MESSAGE: &str =
    "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character (@$!%*?&)";

// Only letters, digits and the accepted special characters
static PASSWORD_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@$!%*?&]+$").expect("password charset regex is valid"));

static PASSWORD_CLASSES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["[a-z]", "[A-Z]", "[0-9]", "[@$!%*?&]"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("password class regex is valid"))
        .collect()
});

/// Validates that a password mixes every required character class and uses
/// nothing outside the accepted charset. Length is checked separately.
pub fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let complex = PASSWORD_CHARSET.is_match(password)
        && PASSWORD_CLASSES.iter().all(|class| class.is_match(password));

    if complex {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_complexity");
        error.message = Some(Cow::Borrowed(PASSWORD_COMPLEXITY_MESSAGE));
        Err(error)
    }
}
