//! Authentication Middleware
//!
//! Bearer-token authentication for protected endpoints.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use log::debug;

use crate::models::PublicUserView;
use crate::service::{AuthError, AuthService};
use crate::utils::error::AppError;

/// Extension type for storing the authenticated user in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUserView);

/// Pull the token out of an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively.
pub fn parse_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".into()))?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or_else(|| AppError::Authentication("Invalid Authorization header format".into()))?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AppError::Authentication(
            "Invalid Authorization header format".into(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Authentication("Missing bearer token".into()));
    }
    Ok(token)
}

/// Authentication middleware that resolves the bearer token to a user
///
/// On success the user's public profile is added to the request extensions
/// as [`AuthUser`]. Any failure, including a token whose user no longer
/// exists, is a 401.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = parse_bearer(&headers)?;

    let user = auth_service
        .authenticate(token)
        .await
        .map_err(|err| match err {
            AuthError::TokenInvalid(_) | AuthError::UserNotFound => {
                AppError::Authentication("Invalid or expired token".into())
            }
            other => {
                debug!("Authentication failed: {}", other);
                AppError::from(other)
            }
        })?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// Helper function to extract the authenticated user from request extensions
///
/// The auth_middleware must be applied to the route for this to work.
pub fn extract_auth_user(request: &Request) -> Result<&PublicUserView, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .map(|auth_user| &auth_user.0)
        .ok_or_else(|| {
            AppError::Authentication("User context not found in request extensions".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::Credentials;
    use crate::service::{SystemClock, TokenService};
    use crate::utils::{CredentialValidator, PasswordHasher};
    use axum::{
        body::Body,
        http::{HeaderValue, Method, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use chrono::{Duration, Utc};
    use jsonwebtoken::Algorithm;
    use tower::util::ServiceExt;

    fn create_test_auth_service() -> Arc<AuthService> {
        let tokens = TokenService::new(
            "test_signing_secret_0123456789abcdef",
            Algorithm::HS256,
            Duration::minutes(30),
        )
        .unwrap();

        Arc::new(AuthService::new(
            Arc::new(MemoryStore::new()),
            PasswordHasher::new(4),
            tokens,
            CredentialValidator::default(),
            Arc::new(SystemClock),
        ))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn auth_test_handler(request: Request<Body>) -> Result<String, AppError> {
        let user = extract_auth_user(&request)?;
        Ok(user.username.clone())
    }

    fn protected_app(auth_service: Arc<AuthService>) -> Router {
        Router::new()
            .route("/test", get(auth_test_handler))
            .layer(from_fn_with_state(auth_service, auth_middleware))
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer(&headers_with("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(parse_bearer(&headers_with("bearer abc")).unwrap(), "abc");
        assert_eq!(parse_bearer(&headers_with("Bearer   abc  ")).unwrap(), "abc");

        assert!(parse_bearer(&HeaderMap::new()).is_err());
        assert!(parse_bearer(&headers_with("Basic dXNlcjpwYXNz")).is_err());
        assert!(parse_bearer(&headers_with("Bearer")).is_err());
        assert!(parse_bearer(&headers_with("Bearer   ")).is_err());
        assert!(parse_bearer(&headers_with("abc.def.ghi")).is_err());
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_header() {
        let app = protected_app(create_test_auth_service());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["www-authenticate"], "Bearer");
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_token() {
        let app = protected_app(create_test_auth_service());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header(AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_token() {
        let auth_service = create_test_auth_service();
        auth_service
            .register(Credentials {
                email: "a@x.com".to_string(),
                username: "alice".to_string(),
                password: "Abcdef12".to_string(),
            })
            .await
            .unwrap();
        let login = auth_service.login("a@x.com", "Abcdef12").await.unwrap();

        let app = protected_app(auth_service);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header(
                AUTHORIZATION,
                format!("Bearer {}", login.token.access_token),
            )
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_token_for_missing_user() {
        let auth_service = create_test_auth_service();
        let token = auth_service
            .tokens()
            .issue("ghost@x.com", "no-such-id", Utc::now())
            .unwrap();

        let app = protected_app(auth_service);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_auth_user_missing() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request).is_err());
    }

    #[test]
    fn test_extract_auth_user_present() {
        let now = Utc::now();
        let user = PublicUserView {
            user_id: "user-1".to_string(),
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
            created_at: now,
            updated_at: now,
            is_active: true,
            is_verified: false,
        };

        let mut request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(AuthUser(user.clone()));

        let result = extract_auth_user(&request).unwrap();
        assert_eq!(result, &user);
    }
}
