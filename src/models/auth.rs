//! Authentication Models
//!
//! Token claims, the issued token and the identity recovered from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::PublicUserView;

/// Value of the `type` claim on access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// JWT claims structure for access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - user email
    pub sub: String,

    /// Identifier of the user record
    pub user_id: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type (always "access")
    #[serde(rename = "type")]
    pub token_type: String,
}

impl AccessTokenClaims {
    pub fn new(
        email: &str,
        user_id: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: email.to_string(),
            user_id: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        }
    }
}

/// Signed bearer token handed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque token string for the `Authorization: Bearer` header
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Lifetime in seconds
    pub expires_in: i64,

    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(access_token: String, expires_in: i64, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
        }
    }
}

/// Identity asserted by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Successful login: the token plus the user it was issued for
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: AccessToken,
    pub user: PublicUserView,
}
