use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentStore, StoreError};
use crate::error::FieldError;
use crate::filter::{Filter, FilterWhereInfo};

/// Identity and timestamps every stored document carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A typed entity stored in one collection.
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    /// Human label used in not-found messages.
    const LABEL: &'static str;
    /// Fields never returned to clients nor usable in list queries.
    const HIDDEN: &'static [&'static str] = &[];

    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;

    fn validate(&self) -> Result<(), Vec<FieldError>>;

    fn id(&self) -> &str {
        &self.meta().id
    }

    /// Client-facing document with hidden fields removed.
    fn to_public(&self) -> Result<Document, serde_json::Error> {
        let mut doc = to_document(self)?;
        for field in Self::HIDDEN {
            doc.remove(*field);
        }
        Ok(doc)
    }
}

pub fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!("expected an object, got {}", other))),
    }
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Typed access to one collection of a [`DocumentStore`].
///
/// Writes assign ids and timestamps and run [`Model::validate`] before any
/// store call, so invalid records never reach persistence.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T: Model> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc))?)),
            None => Ok(None),
        }
    }

    pub async fn select_404(&self, id: &str) -> Result<T, StoreError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} not found with id of {}", T::LABEL, id)))
    }

    pub async fn select_any(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.store
            .find(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(Value::Object(doc)).map_err(StoreError::from))
            .collect()
    }

    pub async fn select_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let mut filter = filter.clone();
        filter.limit(1, None)?;
        Ok(self.select_any(&filter).await?.into_iter().next())
    }

    pub async fn select_ids(&self, ids: &[String]) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut filter = Filter::new();
        filter.where_clause([FilterWhereInfo::any_of("id", ids.iter().cloned())])?;
        self.select_any(&filter).await
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }

    pub async fn create(&self, mut record: T) -> Result<T, StoreError> {
        let now = timestamp_now();
        let meta = record.meta_mut();
        meta.id = Uuid::new_v4().to_string();
        meta.created_at = now.clone();
        meta.updated_at = now;

        record.validate().map_err(StoreError::Validation)?;
        let stored = self.store.insert(T::COLLECTION, to_document(&record)?).await?;
        Ok(serde_json::from_value(Value::Object(stored))?)
    }

    pub async fn update(&self, mut record: T) -> Result<T, StoreError> {
        record.meta_mut().updated_at = timestamp_now();
        record.validate().map_err(StoreError::Validation)?;

        let id = record.id().to_string();
        match self.store.replace(T::COLLECTION, &id, to_document(&record)?).await? {
            Some(stored) => Ok(serde_json::from_value(Value::Object(stored))?),
            None => Err(StoreError::NotFound(format!("{} not found with id of {}", T::LABEL, id))),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if self.store.delete(T::COLLECTION, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("{} not found with id of {}", T::LABEL, id)))
        }
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _phantom: PhantomData,
        }
    }
}
