//! Security Configuration
//!
//! Token signing and password hashing settings. Both are fixed at process
//! start; rotating the signing secret requires a restart and invalidates every
//! outstanding token.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;

use super::{env, ConfigError};
use crate::utils::security::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};

/// Shortest signing secret accepted at startup
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest token lifetime accepted, one year
pub const MAX_TOKEN_LIFETIME_MINUTES: i64 = 60 * 24 * 365;

/// Token signing configuration
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: String,

    /// Signature algorithm; only the HMAC family is accepted
    pub algorithm: Algorithm,

    /// Token lifetime in minutes (default: 30)
    pub expires_minutes: i64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("expires_minutes", &self.expires_minutes)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, algorithm: Algorithm, expires_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            algorithm,
            expires_minutes,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::get_required("JWT_SECRET")?;
        let raw_algorithm = env::get_string("JWT_ALGORITHM", "HS256");
        let algorithm =
            Algorithm::from_str(&raw_algorithm).map_err(|_| ConfigError::InvalidValue {
                key: "JWT_ALGORITHM".to_string(),
                value: raw_algorithm.clone(),
                reason: "unknown algorithm".to_string(),
            })?;

        Ok(Self {
            secret,
            algorithm,
            expires_minutes: env::get_i64("JWT_EXPIRES_MINUTES", 30),
        })
    }

    /// Token lifetime as a duration
    ///
    /// Values too large to represent yield zero, which `validate` rejects.
    pub fn lifetime(&self) -> Duration {
        Duration::try_minutes(self.expires_minutes).unwrap_or_else(Duration::zero)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT secret cannot be empty".into(),
            ));
        }
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::ValidationError(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if !is_hmac(self.algorithm) {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ALGORITHM".to_string(),
                value: format!("{:?}", self.algorithm),
                reason: "only HS256, HS384 and HS512 are supported".to_string(),
            });
        }
        if self.expires_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "JWT lifetime must be greater than 0 minutes".into(),
            ));
        }
        if self.expires_minutes > MAX_TOKEN_LIFETIME_MINUTES {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRES_MINUTES".to_string(),
                value: self.expires_minutes.to_string(),
                reason: format!("must be at most {}", MAX_TOKEN_LIFETIME_MINUTES),
            });
        }
        Ok(())
    }
}

/// Whether `algorithm` is a symmetric HMAC algorithm
pub fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

/// Password hashing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// bcrypt cost factor (higher = more secure but slower)
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        Self {
            bcrypt_cost: env::get_u32("BCRYPT_COST", DEFAULT_BCRYPT_COST),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST".to_string(),
                value: self.bcrypt_cost.to_string(),
                reason: format!(
                    "must be between {} and {}",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST
                ),
            });
        }
        Ok(())
    }
}
