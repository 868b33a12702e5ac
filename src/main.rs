//! Auth Service Server
//!
//! HTTP server exposing registration, login and profile endpoints. Uses
//! PostgreSQL when `DATABASE_URL` is set and an in-memory store otherwise.

use std::sync::Arc;

use axum::http::HeaderValue;
use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth_service::{
    api::create_app,
    config::{AppConfig, ServerConfig},
    database::open_store,
    service::{AuthService, SystemClock},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    env_logger::init();

    log::info!("Starting Auth Service v{}", auth_service::VERSION);

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    config.validate()?;

    log::info!(
        "Configuration loaded: token lifetime {} minutes, bcrypt cost {}",
        config.token.expires_minutes,
        config.security.bcrypt_cost
    );

    let store = open_store(config.database.as_ref()).await?;
    let auth_service = Arc::new(AuthService::from_config(
        store,
        &config,
        Arc::new(SystemClock),
    )?);

    auth_service.health_check().await?;

    let app = create_app(auth_service).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.server))
            .into_inner(),
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Endpoints:");
    log::info!("  GET  /health");
    log::info!("  POST /auth/register");
    log::info!("  POST /auth/login");
    log::info!("  GET  /auth/me, /users/me (Bearer)");
    log::info!("  GET  /users/{{user_id}} (Bearer)");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS policy from `CORS_ORIGINS`; `*` allows any origin
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.cors_origins.is_empty() || server.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
