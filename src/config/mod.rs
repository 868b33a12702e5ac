//! Configuration Module
//!
//! Centralized configuration management for the auth service: server, store,
//! token signing, password hashing and credential policy settings.

pub mod security;

use thiserror::Error;

use crate::database::DatabaseConfig;
use crate::utils::security::MAX_PASSWORD_BYTES;

// Re-export configuration types for convenient access
pub use security::{SecurityConfig, TokenConfig, MAX_TOKEN_LIFETIME_MINUTES, MIN_SECRET_LENGTH};

/// Configuration errors
///
/// Secret values are never echoed back in these messages.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as usize with default
    pub fn get_usize(key: &str, default: usize) -> usize {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// PostgreSQL document store; `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,

    /// Token signing configuration
    pub token: TokenConfig,

    /// Password hashing configuration
    pub security: SecurityConfig,

    /// Registration credential rules
    pub validation: ValidationConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 8000),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Thresholds for registration credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub username_min_length: usize,
    pub username_max_length: usize,
    /// Punctuation accepted in usernames besides ASCII letters and digits
    pub username_allowed_punctuation: String,
    pub password_min_length: usize,
    pub password_max_length: usize,
    pub password_require_uppercase: bool,
    pub password_require_lowercase: bool,
    pub password_require_digit: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            username_min_length: 3,
            username_max_length: 50,
            username_allowed_punctuation: "_".to_string(),
            password_min_length: 8,
            password_max_length: MAX_PASSWORD_BYTES,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_digit: true,
        }
    }
}

impl ValidationConfig {
    /// Load credential rules from environment, falling back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            username_min_length: env::get_usize(
                "USERNAME_MIN_LENGTH",
                defaults.username_min_length,
            ),
            username_max_length: env::get_usize(
                "USERNAME_MAX_LENGTH",
                defaults.username_max_length,
            ),
            username_allowed_punctuation: env::get_string(
                "USERNAME_ALLOWED_PUNCTUATION",
                &defaults.username_allowed_punctuation,
            ),
            password_min_length: env::get_usize(
                "PASSWORD_MIN_LENGTH",
                defaults.password_min_length,
            ),
            password_max_length: env::get_usize(
                "PASSWORD_MAX_LENGTH",
                defaults.password_max_length,
            ),
            password_require_uppercase: env::get_bool(
                "PASSWORD_REQUIRE_UPPERCASE",
                defaults.password_require_uppercase,
            ),
            password_require_lowercase: env::get_bool(
                "PASSWORD_REQUIRE_LOWERCASE",
                defaults.password_require_lowercase,
            ),
            password_require_digit: env::get_bool(
                "PASSWORD_REQUIRE_DIGIT",
                defaults.password_require_digit,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username_min_length == 0 {
            return Err(ConfigError::ValidationError(
                "Username minimum length must be greater than 0".into(),
            ));
        }
        if self.username_min_length > self.username_max_length {
            return Err(ConfigError::ValidationError(
                "Username minimum length cannot exceed the maximum".into(),
            ));
        }
        if self.password_min_length == 0 {
            return Err(ConfigError::ValidationError(
                "Password minimum length must be greater than 0".into(),
            ));
        }
        if self.password_min_length > self.password_max_length {
            return Err(ConfigError::ValidationError(
                "Password minimum length cannot exceed the maximum".into(),
            ));
        }
        if self.password_max_length > MAX_PASSWORD_BYTES {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_MAX_LENGTH".to_string(),
                value: self.password_max_length.to_string(),
                reason: format!("must be at most {}", MAX_PASSWORD_BYTES),
            });
        }
        if self
            .username_allowed_punctuation
            .chars()
            .any(|c| c.is_whitespace() || c.is_alphanumeric())
        {
            return Err(ConfigError::ValidationError(
                "Allowed username punctuation may not contain whitespace or alphanumerics".into(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = if env::is_set("DATABASE_URL") {
            Some(DatabaseConfig::from_env()?)
        } else {
            None
        };

        Ok(Self {
            server: ServerConfig::default(),
            database,
            token: TokenConfig::from_env()?,
            security: SecurityConfig::from_env(),
            validation: ValidationConfig::from_env(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".into(),
            ));
        }

        if let Some(database) = &self.database {
            if database.max_connections == 0 {
                return Err(ConfigError::ValidationError(
                    "Database max_connections must be greater than 0".into(),
                ));
            }
            if database.min_connections > database.max_connections {
                return Err(ConfigError::ValidationError(
                    "Database min_connections cannot be greater than max_connections".into(),
                ));
            }
        }

        self.token.validate()?;
        self.security.validate()?;
        self.validation.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_helpers() {
        assert!(env::get_bool("NONEXISTENT_BOOL", true));
        assert!(!env::get_bool("NONEXISTENT_BOOL", false));
        assert_eq!(env::get_u32("NONEXISTENT_U32", 42), 42);
        assert_eq!(env::get_u64("NONEXISTENT_U64", 600), 600);
        assert_eq!(env::get_string("NONEXISTENT_STRING", "default"), "default");
    }

    #[test]
    fn test_get_required_missing() {
        let err = env::get_required("NONEXISTENT_REQUIRED_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "NONEXISTENT_REQUIRED_VAR"));
    }

    #[test]
    fn test_validation_config_defaults() {
        let config = ValidationConfig::default();
        assert_eq!(config.username_min_length, 3);
        assert_eq!(config.username_max_length, 50);
        assert_eq!(config.password_min_length, 8);
        assert_eq!(config.password_max_length, 72);
        assert!(config.password_require_digit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_config_rejects_inverted_bounds() {
        let config = ValidationConfig {
            password_min_length: 20,
            password_max_length: 10,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ValidationConfig {
            password_max_length: 100,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ValidationConfig {
            username_allowed_punctuation: "_ ".to_string(),
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
