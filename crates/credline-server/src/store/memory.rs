use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use credline_core::{CredlineError, Result, Submission};

use super::RecordStore;

/// In-memory store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Submission>> {
        Ok(self.records.read().await.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn insert(&self, sub: &Submission) -> Result<()> {
        self.records.write().await.push(sub.clone());
        Ok(())
    }

    async fn update(&self, sub: &Submission) -> Result<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|s| s.id == sub.id) {
            Some(slot) => {
                *slot = sub.clone();
                Ok(())
            }
            None => Err(CredlineError::NotFound(format!("submission {}", sub.id))),
        }
    }
}
