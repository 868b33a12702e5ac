//! Service Layer
//!
//! Authentication business logic and the collaborators it is built from.

pub mod auth;
pub mod clock;
pub mod jwt;

// Re-export services
pub use auth::{AuthError, AuthResult, AuthService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{TokenError, TokenService};
