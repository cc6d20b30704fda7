use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::{QueryError, Result},
    model::{QueryDraft, SavedQuery},
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const QUERY_NOT_FOUND: &str = "Query not found";

/// Persistence for saved queries, one document per record.
#[async_trait]
pub trait QueryStore: Send + Sync + Debug {
    /// Assign an id and creation time, then persist.
    async fn create(&self, draft: QueryDraft) -> Result<SavedQuery>;

    /// All records, newest `created_at` first.
    async fn list(&self) -> Result<Vec<SavedQuery>>;

    async fn get(&self, id: &str) -> Result<SavedQuery>;

    /// Replace every mutable field of an existing record.
    async fn update(&self, id: &str, draft: QueryDraft) -> Result<SavedQuery>;

    async fn delete(&self, id: &str) -> Result<()>;
}

pub(crate) fn not_found() -> QueryError {
    QueryError::not_found(QUERY_NOT_FOUND)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Open a store from a connection string.
///
/// Supported: `memory://`, `sqlite::memory:`, `sqlite://<path>`.
pub fn open(database_url: &str) -> anyhow::Result<Arc<dyn QueryStore>> {
    let store: Arc<dyn QueryStore> = if database_url == "memory://" {
        Arc::new(MemoryStore::new())
    } else if database_url == "sqlite::memory:" {
        Arc::new(SqliteStore::in_memory()?)
    } else if let Some(path) = database_url.strip_prefix("sqlite://") {
        Arc::new(SqliteStore::open(path)?)
    } else {
        anyhow::bail!(
            "Unsupported DATABASE_URL '{database_url}'.\n\
             Hint: use `sqlite://<path>` or `memory://`."
        );
    };

    tracing::info!(database_url, "query store opened");
    Ok(store)
}
