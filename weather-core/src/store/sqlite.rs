//! SQLite-backed document store.
//!
//! Each saved query is kept as one JSON document. `created_at` and an
//! autoincrement sequence are duplicated into columns for ordering.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::{path::Path, sync::Arc};

use crate::{
    error::{QueryError, Result},
    model::{QueryDraft, SavedQuery},
};

use super::{QueryStore, new_id, not_found};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and its schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                document TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_queries_created ON queries(created_at DESC, seq DESC);
            "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || op(&*conn.lock()))
            .await
            .map_err(|e| QueryError::store(format!("Store task failed: {e}")))?
    }
}

fn load(conn: &Connection, id: &str) -> Result<Option<SavedQuery>> {
    let doc: Option<String> = conn
        .query_row("SELECT document FROM queries WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(QueryError::from))
        .transpose()
}

#[async_trait]
impl QueryStore for SqliteStore {
    async fn create(&self, draft: QueryDraft) -> Result<SavedQuery> {
        let record = SavedQuery {
            id: new_id(),
            raw_location: draft.raw_location,
            resolved_location: draft.resolved_location,
            date_range: draft.date_range,
            samples: draft.samples,
            created_at: Utc::now(),
        };

        let stored = record.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO queries (id, created_at, document) VALUES (?1, ?2, ?3)",
                params![
                    stored.id,
                    stored.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                    serde_json::to_string(&stored)?,
                ],
            )?;
            Ok(())
        })
        .await?;

        Ok(record)
    }

    async fn list(&self) -> Result<Vec<SavedQuery>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT document FROM queries ORDER BY created_at DESC, seq DESC")?;
            let docs = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            docs.iter()
                .map(|d| serde_json::from_str(d).map_err(QueryError::from))
                .collect()
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<SavedQuery> {
        let id = id.to_string();
        self.blocking(move |conn| load(conn, &id)?.ok_or_else(not_found)).await
    }

    async fn update(&self, id: &str, draft: QueryDraft) -> Result<SavedQuery> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let mut record = load(conn, &id)?.ok_or_else(not_found)?;
            record.apply(draft);
            conn.execute(
                "UPDATE queries SET document = ?1 WHERE id = ?2",
                params![serde_json::to_string(&record)?, id],
            )?;
            Ok(record)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |conn| {
            match conn.execute("DELETE FROM queries WHERE id = ?1", params![id])? {
                0 => Err(not_found()),
                _ => Ok(()),
            }
        })
        .await
    }
}
