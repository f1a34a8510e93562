// Password hashing and verification service

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    /// The stored hash is not a PHC string we can read. This is a data or
    /// configuration fault, never a wrong password.
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Password service for hashing and verification
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Argon2id with explicit cost parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password into a PHC string with a random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored PHC hash.
    ///
    /// A mismatch is `Ok(false)`. The cost parameters are read from the stored
    /// hash, and the digest comparison is constant-time.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_service() -> PasswordService {
        PasswordService::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_hash_then_verify() {
        let service = cheap_service();
        let hash = service.hash("Admin@123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("Admin@123", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let service = cheap_service();
        let hash = service.hash("Admin@123").unwrap();

        assert!(!service.verify("admin@123", &hash).unwrap());
        assert!(!service.verify("", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let service = cheap_service();
        assert_ne!(service.hash("Admin@123").unwrap(), service.hash("Admin@123").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let service = cheap_service();
        assert!(matches!(
            service.verify("whatever", "not-a-phc-string"),
            Err(PasswordError::MalformedHash(_))
        ));
    }

    #[test]
    fn test_verify_uses_params_from_stored_hash() {
        let hash = cheap_service().hash("Admin@123").unwrap();
        let default_service = PasswordService::default();

        assert!(default_service.verify("Admin@123", &hash).unwrap());
    }
}
