//! In-Memory Document Store
//!
//! A `Store` backed by hash maps. Used by the test suite and for local runs
//! without a database. Unique fields can be declared per collection to mimic a
//! database unique index.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::store::{Document, DocumentData, Filter, Store, StoreError, StoreResult};

type Collections = HashMap<String, HashMap<String, DocumentData>>;

/// Thread-safe in-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    unique_fields: HashMap<String, HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject creates whose `field` value already exists in `collection`
    pub fn with_unique_field(mut self, collection: &str, field: &str) -> Self {
        self.unique_fields
            .entry(collection.to_string())
            .or_default()
            .insert(field.to_string());
        self
    }

    /// Remove a document, returning whether it existed
    pub fn remove(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.write()?;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        let collections = self.read()?;
        Ok(collections.get(collection).map(HashMap::len).unwrap_or(0))
    }

    /// Overwrite a document body in place
    pub fn replace(&self, collection: &str, id: &str, data: DocumentData) -> StoreResult<bool> {
        let mut collections = self.write()?;
        match collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
            Some(existing) => {
                *existing = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn violates_unique(
        &self,
        collection: &str,
        existing: &HashMap<String, DocumentData>,
        data: &DocumentData,
    ) -> bool {
        let Some(fields) = self.unique_fields.get(collection) else {
            return false;
        };

        fields.iter().any(|field| match data.get(field) {
            Some(value) => existing
                .values()
                .any(|other| other.get(field) == Some(value)),
            None => false,
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.read()?;
        let found = collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(_, data)| filter.matches(data))
                .map(|(id, data)| Document {
                    id: id.clone(),
                    data: data.clone(),
                })
        });
        Ok(found)
    }

    async fn create(
        &self,
        collection: &str,
        data: DocumentData,
        id: Option<&str>,
    ) -> StoreResult<String> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();

        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if docs.contains_key(&id) || self.violates_unique(collection, docs, &data) {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
            });
        }

        docs.insert(id.clone(), data);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }
}
