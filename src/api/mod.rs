//! API Layer
//!
//! HTTP endpoints and request handling for the authentication service.

pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use handlers::{AppState, SuccessResponse};
pub use middleware::{auth_middleware, extract_auth_user, parse_bearer, AuthUser};
pub use routes::{create_app, create_routes, RouterBuilder};
