//! Database Module
//!
//! The document store contract and its in-memory and PostgreSQL backends.

use std::sync::Arc;

use log::{info, warn};

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export commonly used types
pub use connection::{run_migrations, DatabaseConfig, DatabasePool};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use store::{Document, DocumentData, Filter, Store, StoreError, StoreResult};

/// Open the configured store
///
/// With a database configuration this connects to PostgreSQL and applies
/// pending migrations; without one it falls back to a process-local
/// in-memory store that enforces the same unique email rule.
pub async fn open_store(config: Option<&DatabaseConfig>) -> StoreResult<Arc<dyn Store>> {
    match config {
        Some(config) => {
            let pool = config.create_pool().await?;
            run_migrations(&pool)
                .await
                .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;
            info!("Connected to PostgreSQL document store");
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Ok(Arc::new(
                MemoryStore::new().with_unique_field(crate::models::USERS_COLLECTION, "email"),
            ))
        }
    }
}
