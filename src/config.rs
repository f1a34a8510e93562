// Environment-driven application configuration

use std::time::Duration;

use thiserror::Error;

use crate::auth::token::{DEFAULT_TTL_MINUTES, MAX_TTL_MINUTES};

/// Signing key used only when running in development without JWT_SECRET
const DEVELOPMENT_JWT_SECRET: &str = "gatekeeper-development-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid {
                name: "APP_ENV",
                value: value.to_string(),
            }),
        }
    }

    /// Log filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "gatekeeper_api=debug,tower_http=debug",
            Environment::Production => "gatekeeper_api=info,tower_http=info",
        }
    }
}

/// Runtime settings read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// `None` runs against the in-memory store
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expires_in_minutes: i64,
    pub strict_sessions: bool,
    pub token_sweep_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = match var("APP_ENV") {
            Some(value) => Environment::parse(&value)?,
            None => Environment::Development,
        };
        let production = environment == Environment::Production;

        let database_url = var("DATABASE_URL");
        if production && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let jwt_expires_in_minutes = parse_or(var("JWT_EXPIRES_IN"), "JWT_EXPIRES_IN", DEFAULT_TTL_MINUTES)?;
        if !(1..=MAX_TTL_MINUTES).contains(&jwt_expires_in_minutes) {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRES_IN",
                value: jwt_expires_in_minutes.to_string(),
            });
        }

        let sweep_secs: u64 = parse_or(var("TOKEN_SWEEP_INTERVAL_SECS"), "TOKEN_SWEEP_INTERVAL_SECS", 300)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(var("PORT"), "PORT", 3000)?,
            database_url,
            jwt_secret,
            jwt_expires_in_minutes,
            strict_sessions: parse_bool(var("AUTH_STRICT_SESSIONS"), "AUTH_STRICT_SESSIONS", true)?,
            token_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }

    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            name,
            value: value.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_development_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database_url, None);
        assert!(config.uses_development_secret());
        assert_eq!(config.jwt_expires_in_minutes, 50);
        assert!(config.strict_sessions);
        assert_eq!(config.token_sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_production_requires_secret_and_database() {
        assert_eq!(
            config(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config(&[("APP_ENV", "production"), ("DATABASE_URL", "postgres://db")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );

        let config = config(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("JWT_EXPIRES_IN", "15"),
            ("AUTH_STRICT_SESSIONS", "false"),
            ("TOKEN_SWEEP_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.jwt_expires_in_minutes, 15);
        assert!(!config.strict_sessions);
        assert_eq!(config.token_sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("JWT_EXPIRES_IN", "0")]),
            Err(ConfigError::Invalid { name: "JWT_EXPIRES_IN", .. })
        ));
        assert!(matches!(
            config(&[("AUTH_STRICT_SESSIONS", "maybe")]),
            Err(ConfigError::Invalid { name: "AUTH_STRICT_SESSIONS", .. })
        ));
        assert!(matches!(
            config(&[("APP_ENV", "staging")]),
            Err(ConfigError::Invalid { name: "APP_ENV", .. })
        ));
    }

    #[test]
    fn test_token_lifetime_must_fit_a_timestamp() {
        assert_eq!(
            config(&[("JWT_EXPIRES_IN", "9999999999999")]).unwrap_err(),
            ConfigError::Invalid {
                name: "JWT_EXPIRES_IN",
                value: "9999999999999".to_string(),
            }
        );
        assert!(matches!(
            config(&[("JWT_EXPIRES_IN", "-5")]),
            Err(ConfigError::Invalid { name: "JWT_EXPIRES_IN", .. })
        ));

        let max = MAX_TTL_MINUTES.to_string();
        let config = config(&[("JWT_EXPIRES_IN", max.as_str())]).unwrap();
        assert_eq!(config.jwt_expires_in_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config(&[("PORT", ""), ("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, None);
    }
}
