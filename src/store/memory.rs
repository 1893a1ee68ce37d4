//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentStore, FieldUpdates, InterviewDocument, apply_updates};
use crate::errors::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, InterviewDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document under a fixed id, replacing any existing one.
    pub async fn insert(&self, id: impl Into<String>, doc: InterviewDocument) {
        self.docs.write().await.insert(id.into(), doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, doc: &InterviewDocument) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.docs.write().await.insert(id.clone(), doc.clone());
        Ok(id)
    }

    async fn read(&self, id: &str) -> Result<Option<InterviewDocument>, StoreError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, updates: FieldUpdates) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let current = docs.get(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        let updated = apply_updates(id, current, &updates)?;
        docs.insert(id.to_string(), updated);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, InterviewDocument)>, StoreError> {
        let mut docs: Vec<_> = self
            .docs
            .read()
            .await
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();
        docs.sort_by(|a, b| b.1.last_updated.cmp(&a.1.last_updated));
        Ok(docs)
    }
}
