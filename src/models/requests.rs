//! Request and Response Models
//!
//! Data structures for API request and response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::Credentials;

/// Request payload for registering a new account
///
/// Field rules are enforced by the credential validator inside the auth
/// service, so that they follow runtime configuration.
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl From<RegisterRequest> for Credentials {
    fn from(request: RegisterRequest) -> Self {
        Credentials {
            email: request.email,
            username: request.username,
            password: request.password,
        }
    }
}

/// Request payload for password login
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
