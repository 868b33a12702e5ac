//! User Model
//!
//! Registration input, the persisted user record and its public view.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::{Document, DocumentData, StoreError};

/// Collection holding user documents
pub const USERS_COLLECTION: &str = "users";

/// Unvalidated registration input
///
/// Transient: the plaintext password never leaves the request that carried it.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User representation for external API responses
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUserView {
    /// Unique identifier assigned by the store
    pub user_id: String,

    /// Normalized email address
    pub email: String,

    pub username: String,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user record was last modified
    pub updated_at: DateTime<Utc>,

    pub is_active: bool,

    pub is_verified: bool,
}

/// Persisted user, including the password hash
#[derive(Clone)]
pub(crate) struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_verified: bool,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Stored body of a user document
#[derive(Serialize, Deserialize)]
struct UserDocument {
    email: String,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(default)]
    is_verified: bool,
}

fn default_active() -> bool {
    true
}

impl UserRecord {
    /// Build a new, not yet persisted record; the store assigns the id
    pub fn new(email: String, username: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            email,
            username,
            password_hash,
            created_at: now,
            updated_at: now,
            is_active: true,
            is_verified: false,
        }
    }

    /// Document body for the store (the id lives outside the body)
    pub fn to_document_data(&self) -> Result<DocumentData, StoreError> {
        let doc = UserDocument {
            email: self.email.clone(),
            username: self.username.clone(),
            password_hash: self.password_hash.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
            is_verified: self.is_verified,
        };
        match serde_json::to_value(doc)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::Backend(
                "user document did not serialize to an object".to_string(),
            )),
        }
    }

    /// Rebuild a record from a stored document
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        let doc: UserDocument = serde_json::from_value(serde_json::Value::Object(document.data))?;
        Ok(Self {
            id: document.id,
            email: doc.email,
            username: doc.username,
            password_hash: doc.password_hash,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            is_active: doc.is_active,
            is_verified: doc.is_verified,
        })
    }
}

impl From<UserRecord> for PublicUserView {
    /// Strips the password hash
    fn from(record: UserRecord) -> Self {
        PublicUserView {
            user_id: record.id,
            email: record.email,
            username: record.username,
            created_at: record.created_at,
            updated_at: record.updated_at,
            is_active: record.is_active,
            is_verified: record.is_verified,
        }
    }
}
