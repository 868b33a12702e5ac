//! JWT Token Service
//!
//! Issues and verifies signed, expiring access tokens. Verification is a pure
//! function of the token, the supplied instant and the server secret: there
//! is no session table and nothing to revoke.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{crypto, decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::config::security::{is_hmac, MAX_TOKEN_LIFETIME_MINUTES};
use crate::config::{ConfigError, TokenConfig};
use crate::models::auth::ACCESS_TOKEN_TYPE;
use crate::models::{AccessToken, AccessTokenClaims, UserContext};

/// Reasons a token is rejected or could not be produced
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not a token of the expected shape
    #[error("Token is malformed")]
    Malformed,

    /// Signature does not match, or the token claims a different algorithm
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// The expiry instant has been reached
    #[error("Token has expired")]
    Expired,

    /// Signing failed while issuing
    #[error("Token could not be signed")]
    Signing,
}

/// Token issuance and verification with a server-held HMAC secret
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    /// Create a token service
    ///
    /// Only HMAC algorithms are accepted, the secret must not be empty and the
    /// lifetime must be positive and at most a year.
    pub fn new(secret: &str, algorithm: Algorithm, lifetime: Duration) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT secret cannot be empty".into(),
            ));
        }
        if !is_hmac(algorithm) {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ALGORITHM".to_string(),
                value: format!("{:?}", algorithm),
                reason: "only HS256, HS384 and HS512 are supported".to_string(),
            });
        }
        if lifetime <= Duration::zero() {
            return Err(ConfigError::ValidationError(
                "JWT lifetime must be positive".into(),
            ));
        }
        if lifetime > Duration::minutes(MAX_TOKEN_LIFETIME_MINUTES) {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRES_MINUTES".to_string(),
                value: lifetime.num_minutes().to_string(),
                reason: format!("must be at most {}", MAX_TOKEN_LIFETIME_MINUTES),
            });
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    /// Create a token service from loaded configuration
    pub fn from_config(config: &TokenConfig) -> Result<Self, ConfigError> {
        Self::new(&config.secret, config.algorithm, config.lifetime())
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issue a token for a user, expiring `lifetime` after `issued_at`
    ///
    /// Claims carry whole seconds, so `issued_at` is truncated first and the
    /// reported `expires_at` is exactly the instant `verify` starts failing.
    pub fn issue(
        &self,
        subject_email: &str,
        user_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        let issued_at = issued_at.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or(TokenError::Signing)?
            .trunc_subsecs(0);
        let claims = AccessTokenClaims::new(subject_email, user_id, issued_at, expires_at);

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Signing)?;

        Ok(AccessToken::new(
            token,
            self.lifetime.num_seconds(),
            expires_at,
        ))
    }

    /// Verify a token at the instant `now`
    ///
    /// The signature over everything before the last `.` is checked before
    /// anything inside the token is parsed, so altering any byte of an issued
    /// token, separators included, is an invalid signature. Only the
    /// configured algorithm is accepted regardless of what the token header
    /// claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserContext, TokenError> {
        let (message, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;

        let signature_ok = crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding_key,
            self.algorithm,
        )
        .map_err(|_| TokenError::Malformed)?;
        if !signature_ok {
            return Err(TokenError::InvalidSignature);
        }
        if message.split('.').count() != 2 {
            return Err(TokenError::Malformed);
        }

        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })?;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(TokenError::Malformed);
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        Ok(UserContext {
            user_id: claims.user_id,
            email: claims.sub,
            expires_at,
        })
    }

    /// Allow-list of exactly one algorithm; expiry is checked against the
    /// injected clock instead of the wall clock
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_signing_secret_0123456789abcdef";

    fn create_test_service() -> TokenService {
        TokenService::new(SECRET, Algorithm::HS256, Duration::minutes(30)).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// Replace the character at `index` with `replacement`, or with a
    /// different base64url character when they already match
    fn replace_char(token: &str, index: usize, replacement: char) -> String {
        let mut chars: Vec<char> = token.chars().collect();
        chars[index] = match (chars[index] == replacement, replacement) {
            (false, c) => c,
            (true, 'A') => 'B',
            (true, _) => 'A',
        };
        chars.into_iter().collect()
    }

    fn sign_raw(message: &str) -> String {
        let signature = crypto::sign(
            message.as_bytes(),
            &EncodingKey::from_secret(SECRET.as_bytes()),
            Algorithm::HS256,
        )
        .unwrap();
        format!("{}.{}", message, signature)
    }

    #[test]
    fn test_issue_then_verify_round_trip() {
        let service = create_test_service();
        let now = fixed_now();

        let token = service.issue("a@x.com", "user-1", now).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 1800);
        assert_eq!(token.expires_at, now + Duration::minutes(30));

        let context = service
            .verify(&token.access_token, now + Duration::minutes(29))
            .unwrap();
        assert_eq!(context.email, "a@x.com");
        assert_eq!(context.user_id, "user-1");
        assert_eq!(context.expires_at, now + Duration::minutes(30));
    }

    #[test]
    fn test_issue_is_deterministic_for_same_inputs() {
        let service = create_test_service();
        let first = service.issue("a@x.com", "user-1", fixed_now()).unwrap();
        let second = service.issue("a@x.com", "user-1", fixed_now()).unwrap();
        assert_eq!(first.access_token, second.access_token);
    }

    #[test]
    fn test_expired_at_and_after_expiry() {
        let service = create_test_service();
        let now = fixed_now();
        let token = service.issue("a@x.com", "user-1", now).unwrap();

        let at_expiry = now + Duration::minutes(30);
        assert_eq!(
            service.verify(&token.access_token, at_expiry),
            Err(TokenError::Expired)
        );
        assert_eq!(
            service.verify(&token.access_token, at_expiry + Duration::days(1)),
            Err(TokenError::Expired)
        );
        assert!(service
            .verify(&token.access_token, at_expiry - Duration::seconds(1))
            .is_ok());
    }

    #[test]
    fn test_any_altered_byte_is_an_invalid_signature() {
        let service = create_test_service();
        let now = fixed_now();
        let token = service.issue("a@x.com", "user-1", now).unwrap().access_token;

        for index in 0..token.len() {
            for replacement in ['A', '.', '_'] {
                let tampered = replace_char(&token, index, replacement);
                assert_ne!(tampered, token);
                assert_eq!(
                    service.verify(&tampered, now),
                    Err(TokenError::InvalidSignature),
                    "byte {} replaced with {:?}",
                    index,
                    replacement
                );
            }
        }
    }

    #[test]
    fn test_fractional_issue_instant() {
        let service = create_test_service();
        let issued_at = fixed_now() + Duration::milliseconds(900);
        let token = service.issue("a@x.com", "user-1", issued_at).unwrap();

        assert_eq!(token.expires_at, fixed_now() + Duration::minutes(30));

        let just_before = token.expires_at - Duration::milliseconds(500);
        let context = service.verify(&token.access_token, just_before).unwrap();
        assert_eq!(context.expires_at, token.expires_at);
        assert_eq!(
            service.verify(&token.access_token, token.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_issue_does_not_overflow_at_the_end_of_time() {
        let service = create_test_service();
        assert!(matches!(
            service.issue("a@x.com", "user-1", DateTime::<Utc>::MAX_UTC),
            Err(TokenError::Signing)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let service = create_test_service();
        let other = TokenService::new(
            "another_secret_0123456789abcdefghij",
            Algorithm::HS256,
            Duration::minutes(30),
        )
        .unwrap();

        let token = other.issue("a@x.com", "user-1", fixed_now()).unwrap();
        assert_eq!(
            service.verify(&token.access_token, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let service = create_test_service();
        let hs512 = TokenService::new(SECRET, Algorithm::HS512, Duration::minutes(30)).unwrap();

        let token = hs512.issue("a@x.com", "user-1", fixed_now()).unwrap();
        assert_eq!(
            service.verify(&token.access_token, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_header_algorithm_is_not_trusted() {
        let service = create_test_service();
        let now = fixed_now();
        let claims = AccessTokenClaims::new("a@x.com", "user-1", now, now + Duration::hours(1));

        // Signed with the right secret but claiming HS384 in the header
        let forged = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            service.verify(&forged, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let service = create_test_service();
        let now = fixed_now();

        assert_eq!(service.verify("", now), Err(TokenError::Malformed));
        assert_eq!(service.verify("not-a-token", now), Err(TokenError::Malformed));

        // Unsigned strings with separators fail the signature check first
        assert_eq!(service.verify("a.b", now), Err(TokenError::InvalidSignature));
        assert_eq!(service.verify("a.b.", now), Err(TokenError::InvalidSignature));
        assert_eq!(
            service.verify("a.b.c.d", now),
            Err(TokenError::InvalidSignature)
        );

        // Correctly signed, but not three segments
        assert_eq!(service.verify(&sign_raw("a"), now), Err(TokenError::Malformed));
        assert_eq!(
            service.verify(&sign_raw("a.b.c"), now),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_correctly_signed_garbage_is_malformed() {
        let service = create_test_service();
        let now = fixed_now();

        // Valid signature over claims that lack user_id
        let claims = serde_json::json!({ "sub": "a@x.com", "exp": now.timestamp() + 60 });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service.verify(&token, now), Err(TokenError::Malformed));

        // Valid signature, wrong token type
        let mut claims = AccessTokenClaims::new("a@x.com", "user-1", now, now + Duration::hours(1));
        claims.token_type = "refresh".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service.verify(&token, now), Err(TokenError::Malformed));
    }

    #[test]
    fn test_constructor_rejects_bad_configuration() {
        assert!(TokenService::new("", Algorithm::HS256, Duration::minutes(30)).is_err());
        assert!(TokenService::new(SECRET, Algorithm::RS256, Duration::minutes(30)).is_err());
        assert!(TokenService::new(SECRET, Algorithm::HS256, Duration::zero()).is_err());
        assert!(TokenService::new(
            SECRET,
            Algorithm::HS256,
            Duration::minutes(MAX_TOKEN_LIFETIME_MINUTES + 1)
        )
        .is_err());
    }
}
