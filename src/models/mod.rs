//! Data Models Module
//!
//! User records, token types and request/response payloads used throughout
//! the auth service.

pub mod auth;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::{AccessToken, AccessTokenClaims, LoginResponse, UserContext};
pub use requests::*;
pub use user::{Credentials, PublicUserView, USERS_COLLECTION};
pub(crate) use user::UserRecord;
