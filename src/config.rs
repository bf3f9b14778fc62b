use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::jwt::MIN_SECRET_LEN;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub request_timeout: Duration,
    pub dev_mode: bool,
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let dev_mode = lookup("LM_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        let jwt_expiration_hours = parse_or(&lookup, "JWT_EXPIRATION_HOURS", 24u64)?;
        if jwt_expiration_hours == 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRATION_HOURS",
                reason: "must be positive".into(),
            });
        }

        let timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 3000u16)?,
            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "license_manager.db".to_string()),
            jwt_secret,
            jwt_expiration_hours,
            request_timeout: Duration::from_secs(timeout_secs),
            dev_mode,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:3000");
        assert_eq!(config.database_path, "license_manager.db");
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { name: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("LM_ENV", "dev"),
            ("JWT_EXPIRATION_HOURS", "2"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.dev_mode);
        assert_eq!(config.jwt_expiration_hours, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_port() {
        assert!(matches!(
            load(&[("JWT_SECRET", SECRET), ("PORT", "http")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }
}
