//! Authentication Service
//!
//! Registration, password login and bearer-token authentication on top of a
//! document store. Every collaborator is injected so that the service holds
//! no ambient state of its own.

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::database::{Filter, Store, StoreError};
use crate::models::{Credentials, LoginResponse, PublicUserView, UserRecord, USERS_COLLECTION};
use crate::service::clock::Clock;
use crate::service::jwt::{TokenError, TokenService};
use crate::utils::{
    error::AppError,
    security::{token_fingerprint, HashingError, PasswordHasher},
    validation::{normalize_email, CredentialValidator, Violations},
};

/// Failures surfaced by [`AuthService`]
#[derive(Error, Debug)]
pub enum AuthError {
    /// Registration input broke one or more credential rules
    #[error("Validation failed: {0}")]
    ValidationFailed(Violations),

    /// An account with this email already exists
    #[error("A user with this email already exists")]
    DuplicateUser,

    /// An account with this username already exists
    #[error("Username is already taken")]
    UsernameTaken,

    /// Unknown email, wrong password or inactive account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bearer token rejected
    #[error("Invalid token: {0}")]
    TokenInvalid(TokenError),

    /// The referenced account does not exist or is inactive
    #[error("User not found")]
    UserNotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] HashingError),

    /// The token could not be signed
    #[error("Token generation failed")]
    TokenGeneration,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ValidationFailed(violations) => AppError::Validation {
                message: "Invalid registration data".to_string(),
                details: Some(violations.to_details()),
            },
            AuthError::DuplicateUser => {
                AppError::Conflict("A user with this email already exists".to_string())
            }
            AuthError::UsernameTaken => AppError::Conflict("Username is already taken".to_string()),
            AuthError::InvalidCredentials => {
                AppError::Authentication("Invalid email or password".to_string())
            }
            AuthError::TokenInvalid(_) => {
                AppError::Authentication("Invalid or expired token".to_string())
            }
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthError::Store(e) => AppError::Internal(format!("Store error: {}", e)),
            AuthError::Hashing(e) => AppError::Internal(format!("Hashing error: {}", e)),
            AuthError::TokenGeneration => {
                AppError::Internal("Token generation failed".to_string())
            }
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Orchestrates the register, login and authenticate flows
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
    tokens: TokenService,
    validator: CredentialValidator,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: PasswordHasher,
        tokens: TokenService,
        validator: CredentialValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            validator,
            clock,
        }
    }

    /// Assemble the service from loaded configuration
    pub fn from_config(
        store: Arc<dyn Store>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            store,
            PasswordHasher::new(config.security.bcrypt_cost),
            TokenService::from_config(&config.token)?,
            CredentialValidator::new(config.validation.clone()),
            clock,
        ))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create a new account
    ///
    /// Invalid input is rejected before the store is touched. The
    /// check-then-insert sequence is not atomic; a backend with a unique
    /// email index closes the window and its conflict surfaces as
    /// [`AuthError::DuplicateUser`].
    pub async fn register(&self, credentials: Credentials) -> AuthResult<PublicUserView> {
        if let Err(violations) = self.validator.validate(&credentials) {
            debug!("Registration rejected: {}", violations);
            return Err(AuthError::ValidationFailed(violations));
        }

        let email = normalize_email(&credentials.email);

        if self.find_user("email", &email).await?.is_some() {
            debug!("Registration rejected: email {} already registered", email);
            return Err(AuthError::DuplicateUser);
        }
        if self
            .find_user("username", &credentials.username)
            .await?
            .is_some()
        {
            debug!(
                "Registration rejected: username {} already taken",
                credentials.username
            );
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.hash_password(credentials.password).await?;

        let mut record = UserRecord::new(
            email,
            credentials.username,
            password_hash,
            self.clock.now(),
        );
        let data = record.to_document_data()?;

        record.id = match self.store.create(USERS_COLLECTION, data, None).await {
            Ok(id) => id,
            Err(StoreError::Conflict { .. }) => {
                warn!("Store rejected duplicate user {}", record.email);
                return Err(AuthError::DuplicateUser);
            }
            Err(e) => return Err(AuthError::Store(e)),
        };

        info!("Registered user {}", record.id);
        Ok(record.into())
    }

    /// Exchange email and password for an access token
    ///
    /// Unknown email, wrong password and inactive account are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginResponse> {
        let email = normalize_email(email);

        let record = match self.find_user("email", &email).await? {
            Some(record) => record,
            None => {
                self.verify_decoy(password.to_string()).await;
                debug!("Login failed: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let password_ok = self
            .verify_password(password.to_string(), record.password_hash.clone())
            .await;
        if !password_ok {
            debug!("Login failed for user {}: wrong password", record.id);
            return Err(AuthError::InvalidCredentials);
        }
        if !record.is_active {
            debug!("Login failed for user {}: account inactive", record.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&record.email, &record.id, self.clock.now())
            .map_err(|e| {
                warn!("Failed to sign token for user {}: {}", record.id, e);
                AuthError::TokenGeneration
            })?;

        info!(
            "User {} logged in (token {})",
            record.id,
            token_fingerprint(&token.access_token)
        );
        Ok(LoginResponse {
            token,
            user: record.into(),
        })
    }

    /// Resolve a bearer token to the user it was issued for
    pub async fn authenticate(&self, bearer_token: &str) -> AuthResult<PublicUserView> {
        let context = self
            .tokens
            .verify(bearer_token, self.clock.now())
            .map_err(|kind| {
                debug!(
                    "Token {} rejected: {}",
                    token_fingerprint(bearer_token),
                    kind
                );
                AuthError::TokenInvalid(kind)
            })?;

        let record = self.load_user(&context.user_id).await?;
        if !record.is_active {
            debug!("Token for inactive user {} rejected", record.id);
            return Err(AuthError::UserNotFound);
        }

        Ok(record.into())
    }

    /// Fetch a user's public profile by id
    pub async fn get_user(&self, user_id: &str) -> AuthResult<PublicUserView> {
        Ok(self.load_user(user_id).await?.into())
    }

    /// Check that the backing store is reachable
    pub async fn health_check(&self) -> AuthResult<()> {
        self.store.ping().await?;
        Ok(())
    }

    async fn load_user(&self, user_id: &str) -> AuthResult<UserRecord> {
        match self.store.get(USERS_COLLECTION, user_id).await? {
            Some(document) => Ok(UserRecord::from_document(document)?),
            None => {
                debug!("User {} not found", user_id);
                Err(AuthError::UserNotFound)
            }
        }
    }

    async fn find_user(&self, field: &str, value: &str) -> AuthResult<Option<UserRecord>> {
        let filter = Filter::eq(field, value);
        match self.store.find_one(USERS_COLLECTION, &filter).await? {
            Some(document) => Ok(Some(UserRecord::from_document(document)?)),
            None => Ok(None),
        }
    }

    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashingError::new(format!("hashing task failed: {}", e)))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> bool {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }

    async fn verify_decoy(&self, password: String) {
        let hasher = self.hasher.clone();
        let _ = tokio::task::spawn_blocking(move || hasher.verify_decoy(&password)).await;
    }
}
