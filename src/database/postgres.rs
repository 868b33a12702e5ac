//! PostgreSQL Document Store
//!
//! Stores documents as JSONB rows in a single `documents` table keyed by
//! `(collection, id)`. The migration adds a unique index on the email of user
//! documents, which turns a lost check-then-insert race into a
//! [`StoreError::Conflict`].

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::store::{Document, DocumentData, Filter, Store, StoreError, StoreResult};

/// `Store` implementation over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn row_to_document(row: PgRow) -> StoreResult<Document> {
    let id: String = row.try_get("id")?;
    let Json(data): Json<DocumentData> = row.try_get("data")?;
    Ok(Document { id, data })
}

fn map_insert_error(collection: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict {
            collection: collection.to_string(),
        },
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl Store for PgDocumentStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut containment = DocumentData::new();
        containment.insert(filter.field.clone(), filter.value.clone());

        let row = sqlx::query(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(Json(Value::Object(containment)))
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_document).transpose()
    }

    async fn create(
        &self,
        collection: &str,
        data: DocumentData,
        id: Option<&str>,
    ) -> StoreResult<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(Value::Object(data)))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(collection, e))?;

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_document).transpose()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
