// JWT token generation and validation service

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenSubject};

/// Default token lifetime in minutes
pub const DEFAULT_TTL_MINUTES: i64 = 50;

/// Longest lifetime accepted from configuration (100 years)
pub const MAX_TTL_MINUTES: i64 = 100 * 365 * 24 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature mismatch, wrong algorithm, or not a JWT at all
    #[error("token signature or structure is invalid")]
    InvalidSignature,

    /// Correctly signed but past its `exp`. Carries the decoded claims so the
    /// caller can clean up the ledger.
    #[error("token expired at {}", .claims.exp)]
    Expired { claims: Box<Claims> },

    #[error("token signing secret is not configured")]
    Misconfigured,

    /// The configured lifetime pushes `exp` past what a timestamp can hold
    #[error("token lifetime of {0} minutes is out of range")]
    LifetimeOutOfRange(i64),

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// A freshly signed token and the window it is valid for
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Token service for JWT operations
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_minutes: i64,
}

impl TokenService {
    /// Create a new TokenService with secret key and lifetime in minutes
    pub fn new(secret: impl Into<String>, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_minutes,
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    pub fn issue(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Sign a token as if the clock read `now`.
    ///
    /// Timestamps are truncated to whole seconds so the `exp` claim and the
    /// returned `expires_at` are identical.
    pub fn issue_at(&self, subject: &TokenSubject, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::Misconfigured);
        }

        let issued_at = now.trunc_subsecs(0);
        let expires_at = Duration::try_minutes(self.ttl_minutes)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or(TokenError::LifetimeOutOfRange(self.ttl_minutes))?;

        let claims = Claims {
            user_id: subject.user_id,
            name: subject.name.clone(),
            email: subject.email.clone(),
            roles: subject.roles.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Check the signature, then the embedded expiry against `now`.
    ///
    /// Expiry is evaluated on the decoded claims rather than inside the JWT
    /// library so an expired token is always reported as `Expired`, never as
    /// an invalid signature.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::Misconfigured);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            TokenError::InvalidSignature
        })?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired {
                claims: Box::new(claims),
            });
        }

        Ok(claims)
    }
}
