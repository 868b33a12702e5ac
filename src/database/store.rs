//! Document Store Contract
//!
//! The narrow persistence interface the auth core depends on. Any backend that
//! can find a document by a single field, create a document and fetch one by
//! id can serve as the user store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Document body: a JSON object without its id
pub type DocumentData = Map<String, Value>;

/// Errors surfaced by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness rule of the store rejected the write
    #[error("Document conflicts with an existing document in '{collection}'")]
    Conflict { collection: String },

    /// Backend-specific failure that is not a database driver error
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Database driver failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A document could not be encoded or decoded
    #[error("Document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document with its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: DocumentData,
}

/// Single-field equality predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    /// Match documents whose `field` equals `value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `data` satisfies this filter
    pub fn matches(&self, data: &DocumentData) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

/// Document-oriented persistence collaborator
///
/// Implementations may be slow and may fail; callers treat every failure as a
/// [`StoreError`]. Only single-document read-your-writes consistency is
/// assumed.
#[async_trait]
pub trait Store: Send + Sync {
    /// First document in `collection` matching `filter`, if any
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Insert a document and return its id
    ///
    /// When `id` is `None` the store assigns one.
    async fn create(
        &self,
        collection: &str,
        data: DocumentData,
        id: Option<&str>,
    ) -> StoreResult<String>;

    /// Document with the given id, if any
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Connectivity check used by health endpoints
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let data = json!({"email": "a@x.com", "is_active": true});
        let data = data.as_object().unwrap();

        assert!(Filter::eq("email", "a@x.com").matches(data));
        assert!(Filter::eq("is_active", true).matches(data));
        assert!(!Filter::eq("email", "b@x.com").matches(data));
        assert!(!Filter::eq("missing", "a@x.com").matches(data));
    }

    #[test]
    fn test_conflict_message_names_collection() {
        let err = StoreError::Conflict {
            collection: "users".to_string(),
        };
        assert!(err.to_string().contains("'users'"));
    }
}
