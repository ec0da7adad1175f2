use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{document_id, unique_fields, Document, DocumentStore, StoreError};
use crate::filter::Filter;

/// Collections held in process memory, in insertion order.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(existing: &[Document], collection: &str, doc: &Document) -> Result<(), StoreError> {
        let id = document_id(doc);
        for field in unique_fields(collection) {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = existing
                .iter()
                .any(|other| document_id(other) != id && other.get(field) == Some(value));
            if taken {
                return Err(StoreError::Duplicate(field.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        docs.sort_by(|a, b| filter.compare(a, b));
        let (offset, limit) = filter.window();
        Ok(docs
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| document_id(d) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        Self::check_unique(docs, collection, &doc)?;
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Self::check_unique(docs, collection, &doc)?;
        match docs.iter_mut().find(|d| document_id(d) == Some(id)) {
            Some(slot) => {
                *slot = doc.clone();
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| document_id(d) != Some(id));
        Ok(docs.len() != before)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
