//! API Route Definitions
//!
//! HTTP routes and their handlers, assembled with a builder so that a
//! deployment can expose only the endpoints it needs. Routes that need a
//! signed-in user are wrapped in the bearer-token middleware.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use super::handlers::*;
use super::middleware::auth_middleware;
use crate::service::AuthService;

/// Builder for creating API routes with configurable endpoints
#[derive(Default)]
pub struct RouterBuilder {
    /// Whether to enable the health check endpoint (GET /health)
    health_check: bool,
    /// Whether to enable account registration (POST /auth/register)
    register: bool,
    /// Whether to enable password login (POST /auth/login)
    login: bool,
    /// Whether to enable the current-user endpoints (GET /auth/me, GET /users/me)
    current_user: bool,
    /// Whether to enable user retrieval by id (GET /users/{user_id})
    get_user: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with all routes enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            register: true,
            login: true,
            current_user: true,
            get_user: true,
        }
    }

    /// Creates a router builder for a service that issues tokens but does
    /// not serve profiles
    pub fn with_auth_routes() -> Self {
        Self {
            health_check: true,
            register: true,
            login: true,
            current_user: false,
            get_user: false,
        }
    }

    /// Creates a router with only the health check endpoint
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    /// Enables or disables the health check endpoint (GET /health)
    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// Enables or disables account registration (POST /auth/register)
    pub fn register(mut self, enabled: bool) -> Self {
        self.register = enabled;
        self
    }

    /// Enables or disables password login (POST /auth/login)
    pub fn login(mut self, enabled: bool) -> Self {
        self.login = enabled;
        self
    }

    /// Enables or disables GET /auth/me and GET /users/me
    pub fn current_user(mut self, enabled: bool) -> Self {
        self.current_user = enabled;
        self
    }

    /// Enables or disables GET /users/{user_id}
    pub fn get_user(mut self, enabled: bool) -> Self {
        self.get_user = enabled;
        self
    }

    fn has_protected_routes(&self) -> bool {
        self.current_user || self.get_user
    }

    /// Builds the Axum router with the configured routes
    ///
    /// `auth_service` backs the bearer middleware on protected routes.
    pub fn build(self, auth_service: Arc<AuthService>) -> Router<AppState> {
        let mut router = Router::new();

        if self.health_check {
            router = router.route("/health", get(health_check));
        }

        if self.register {
            router = router.route("/auth/register", post(register));
        }

        if self.login {
            router = router.route("/auth/login", post(login));
        }

        if self.has_protected_routes() {
            let mut protected = Router::new();

            if self.current_user {
                protected = protected
                    .route("/auth/me", get(current_user))
                    .route("/users/me", get(current_user));
            }

            if self.get_user {
                protected = protected.route("/users/{user_id}", get(get_user));
            }

            router = router.merge(
                protected.route_layer(from_fn_with_state(auth_service, auth_middleware)),
            );
        }

        router
    }
}

/// Creates all API routes
pub fn create_routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    RouterBuilder::with_all_routes().build(auth_service)
}

/// Creates the complete application with state attached
pub fn create_app(auth_service: Arc<AuthService>) -> Router {
    create_routes(auth_service.clone()).with_state(AppState::new(auth_service))
}
