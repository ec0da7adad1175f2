//! Document persistence behind one async trait.
//!
//! Every entity is a JSON object stored in a named collection. Two backends
//! implement [`DocumentStore`]: Postgres (a single JSONB table) and an
//! in-process map used for tests and database-free development.

pub mod memory;
pub mod postgres;
pub mod repository;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::FieldError;
use crate::filter::{Filter, FilterError};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use repository::{to_document, timestamp_now, Meta, Model, Repository};

pub type Document = Map<String, Value>;

/// Fields whose values must be unique within their collection.
pub const UNIQUE_FIELDS: &[(&str, &str)] = &[("accounts", "email")];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Duplicate value for field: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching `filter`, ordered and windowed by it.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Matches for `filter` ignoring its window.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Stores a new document; its `id` field must already be set.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// Replaces the whole document. `None` when no document has that id.
    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<Option<Document>, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub(crate) fn document_id(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

pub(crate) fn unique_fields(collection: &str) -> impl Iterator<Item = &'static str> + '_ {
    UNIQUE_FIELDS
        .iter()
        .filter(move |(c, _)| *c == collection)
        .map(|(_, field)| *field)
}
