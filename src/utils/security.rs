//! Security Utilities
//!
//! Password hashing and log-safe token fingerprints.

use bcrypt::{hash, verify, DEFAULT_COST};
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Smallest cost bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;

/// Largest cost bcrypt accepts
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt only reads this many bytes of input; longer passwords are refused
/// rather than silently truncated
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Plaintext behind the decoy hash. Never a valid password for any account
/// because it fails the password complexity rules.
const DECOY_PLAINTEXT: &str = "decoy-password-for-timing";

/// Password hashing failed
///
/// Carries only the classification of the failure, never the input.
#[derive(Error, Debug)]
#[error("password hashing failed: {0}")]
pub struct HashingError(String);

impl HashingError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<bcrypt::BcryptError> for HashingError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self(err.to_string())
    }
}

/// bcrypt password hasher with a fixed work factor
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    decoy: Arc<OnceLock<String>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a freshly generated salt
    ///
    /// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashingError::new(format!(
                "password longer than {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        Ok(hash(plaintext, self.cost)?)
    }

    /// Verify a password against a stored hash
    ///
    /// Mismatches, malformed hashes and over-long passwords all yield
    /// `false`. The bcrypt work is done in every case.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let matched = verify(plaintext, hash).unwrap_or(false);
        matched && plaintext.len() <= MAX_PASSWORD_BYTES
    }

    /// Spend the same effort as [`verify`](Self::verify) and always fail
    ///
    /// Used when no account matches, so that the response time does not tell
    /// an unknown email apart from a wrong password.
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        let decoy = self
            .decoy
            .get_or_init(|| hash(DECOY_PLAINTEXT, self.cost).unwrap_or_default());
        let _ = self.verify(plaintext, decoy);
        false
    }
}

/// Short, non-reversible identifier for a token, safe to write to logs
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}
