//! Auth Service Library
//!
//! User registration, password login and stateless bearer-token
//! authentication over a pluggable document store.
//!
//! # Features
//!
//! - **Password Security**: bcrypt hashing with configurable cost factors
//! - **Signed Tokens**: HMAC-signed JWT access tokens with a fixed lifetime
//! - **Credential Rules**: configurable email, username and password checks
//! - **Pluggable Storage**: in-memory store or PostgreSQL JSONB documents
//! - **Flexible Router**: Configurable endpoints via RouterBuilder pattern
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use auth_service::{
//!     config::AppConfig,
//!     database::open_store,
//!     models::Credentials,
//!     service::{AuthService, SystemClock},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let store = open_store(config.database.as_ref()).await?;
//!     let auth = AuthService::from_config(store, &config, Arc::new(SystemClock))?;
//!
//!     let user = auth
//!         .register(Credentials {
//!             email: "alice@example.com".to_string(),
//!             username: "alice".to_string(),
//!             password: "SecurePass123".to_string(),
//!         })
//!         .await?;
//!     let login = auth.login("alice@example.com", "SecurePass123").await?;
//!     let me = auth.authenticate(&login.token.access_token).await?;
//!     assert_eq!(me.user_id, user.user_id);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Router Builder Examples
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use auth_service::{api::{AppState, RouterBuilder}, service::AuthService};
//! # fn routers(auth: Arc<AuthService>) {
//! // Full service with all endpoints
//! let full: axum::Router = RouterBuilder::with_all_routes()
//!     .build(auth.clone())
//!     .with_state(AppState::new(auth.clone()));
//!
//! // Token issuer without profile endpoints
//! let issuer: axum::Router = RouterBuilder::new()
//!     .health_check(true)
//!     .register(true)
//!     .login(true)
//!     .build(auth.clone())
//!     .with_state(AppState::new(auth));
//! # }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, bearer middleware and route definitions
//! - **Service Layer**: AuthService, TokenService and the injected clock
//! - **Models**: Data structures and type definitions
//! - **Database**: The store contract and its backends
//! - **Utils**: Password hashing, credential validation and error handling

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration management for all service settings
pub mod config;

/// Document store contract and backends
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Authentication services
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_app, create_routes, AppState, RouterBuilder};
pub use models::{AccessToken, Credentials, LoginResponse, PublicUserView, UserContext};
pub use service::{AuthError, AuthService, Clock, SystemClock, TokenError, TokenService};
pub use utils::error::{AppError, AppResult, ErrorResponse};
pub use utils::security::PasswordHasher;
pub use utils::validation::CredentialValidator;

// Re-export database utilities for configuration
pub use database::{open_store, DatabaseConfig, MemoryStore, Store};

// Re-export configuration system
pub use config::{env, AppConfig, SecurityConfig, ServerConfig, TokenConfig, ValidationConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
