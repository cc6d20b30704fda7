use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::Result,
    model::{QueryDraft, SavedQuery},
};

use super::{QueryStore, new_id, not_found};

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    // Insertion order.
    records: RwLock<Vec<SavedQuery>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueryStore for MemoryStore {
    async fn create(&self, draft: QueryDraft) -> Result<SavedQuery> {
        let record = SavedQuery {
            id: new_id(),
            raw_location: draft.raw_location,
            resolved_location: draft.resolved_location,
            date_range: draft.date_range,
            samples: draft.samples,
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<SavedQuery>> {
        let mut all: Vec<SavedQuery> = self.records.read().await.iter().rev().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn get(&self, id: &str) -> Result<SavedQuery> {
        self.records
            .read()
            .await
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn update(&self, id: &str, draft: QueryDraft) -> Result<SavedQuery> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(not_found)?;
        record.apply(draft);
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        let idx = records
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(not_found)?;
        records.remove(idx);
        Ok(())
    }
}
