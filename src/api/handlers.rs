//! HTTP Request Handlers
//!
//! Axum handlers for processing HTTP requests and responses.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use super::middleware::AuthUser;
use crate::{
    models::{requests::*, LoginResponse, PublicUserView},
    service::AuthService,
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }
}

/// Standard success response wrapper
#[derive(serde::Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<PublicUserView>>)> {
    let user = state.auth_service.register(request.into()).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// Exchange email and password for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SuccessResponse<LoginResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let response = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Profile of the user the bearer token belongs to
pub async fn current_user(
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Json<SuccessResponse<PublicUserView>> {
    Json(SuccessResponse::new(user))
}

/// Get user by ID
///
/// Callers may only read their own profile.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> AppResult<Json<SuccessResponse<PublicUserView>>> {
    if caller.user_id != user_id {
        return Err(AppError::Forbidden(
            "Access to other users' profiles is not allowed".to_string(),
        ));
    }

    let user = state.auth_service.get_user(&user_id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<HealthCheckResponse>>> {
    // Check store connectivity
    state.auth_service.health_check().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(SuccessResponse::new(response)))
}

/// Handle validation errors from request parsing
pub fn handle_validation_error(err: validator::ValidationErrors) -> AppError {
    let mut details = serde_json::Map::new();

    for (field, errors) in err.field_errors() {
        let messages: Vec<String> = errors
            .iter()
            .map(|error| {
                error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for field '{}'", field))
            })
            .collect();
        details.insert(field.to_string(), serde_json::json!(messages));
    }

    AppError::Validation {
        message: "Invalid request data".to_string(),
        details: Some(serde_json::Value::Object(details)),
    }
}
