use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::QueryConfig;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, FilterError, FilterWhereInfo, Pagination};
use crate::middleware::ListResponse;
use crate::models::Account;
use crate::store::{Document, DocumentStore, Model, StoreError};

/// Replace reference ids at `path` with a projection of the documents they name.
#[derive(Debug, Clone, Copy)]
pub struct Populate {
    pub path: &'static str,
    pub collection: &'static str,
    /// Fields kept on each populated document besides `id`. Empty keeps all
    /// non-hidden fields.
    pub select: &'static [&'static str],
    pub hidden: &'static [&'static str],
}

impl Populate {
    pub const fn accounts(path: &'static str, select: &'static [&'static str]) -> Self {
        Self {
            path,
            collection: Account::COLLECTION,
            select,
            hidden: Account::HIDDEN,
        }
    }
}

pub const NAME_ONLY: &[&str] = &["firstName", "lastName"];

/// Filtered, sorted, projected, paginated listing shared by every list route.
pub struct ListService {
    store: Arc<dyn DocumentStore>,
    config: QueryConfig,
}

impl ListService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &QueryConfig) -> Self {
        Self {
            store,
            config: config.clone(),
        }
    }

    /// Runs the request's query against `T`'s collection, narrowed by `base`.
    pub async fn list<T: Model>(
        &self,
        raw_query: Option<&str>,
        base: Vec<FilterWhereInfo>,
        populate: Option<Populate>,
    ) -> Result<ListResponse<Document>, ApiError> {
        let data = FilterData::from_query(raw_query, &self.config)?;
        reject_hidden(&data, T::HIDDEN)?;

        let mut filter = Filter::new();
        filter.assign(&data)?;
        filter.where_clause(base)?;

        let total = self.store.count(T::COLLECTION, &filter).await?;
        let mut docs = self.store.find(T::COLLECTION, &filter).await?;

        for doc in docs.iter_mut() {
            strip_fields(doc, T::HIDDEN);
            project(doc, data.select.as_slice());
        }
        if let Some(populate) = populate {
            self.populate(&mut docs, &populate).await?;
        }

        tracing::debug!(
            "Listed {} of {} {} (page {}, limit {})",
            docs.len(),
            total,
            T::COLLECTION,
            data.page,
            data.limit
        );

        Ok(ListResponse::new(docs, Pagination::compute(data.page, data.limit, total)))
    }

    pub async fn populate(&self, docs: &mut [Document], populate: &Populate) -> Result<(), StoreError> {
        let mut ids: Vec<String> = Vec::new();
        for doc in docs.iter() {
            for id in reference_ids(doc.get(populate.path)) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return Ok(());
        }

        let mut filter = Filter::new();
        filter.where_clause([FilterWhereInfo::any_of("id", ids)])?;
        let referenced: HashMap<String, Value> = self
            .store
            .find(populate.collection, &filter)
            .await?
            .into_iter()
            .filter_map(|mut found| {
                strip_fields(&mut found, populate.hidden);
                project(&mut found, populate.select);
                let id = found.get("id")?.as_str()?.to_string();
                Some((id, Value::Object(found)))
            })
            .collect();

        for doc in docs.iter_mut() {
            let Some(slot) = doc.get_mut(populate.path) else {
                continue;
            };
            *slot = match slot.take() {
                Value::String(id) => referenced.get(&id).cloned().unwrap_or(Value::Null),
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .filter_map(|item| item.as_str().and_then(|id| referenced.get(id)).cloned())
                        .collect(),
                ),
                other => other,
            };
        }
        Ok(())
    }

    /// Public view of one record with `populate` applied.
    pub async fn show<T: Model>(&self, record: &T, populate: Option<Populate>) -> Result<Document, ApiError> {
        let mut doc = record.to_public().map_err(StoreError::from)?;
        if let Some(populate) = populate {
            self.populate(std::slice::from_mut(&mut doc), &populate).await?;
        }
        Ok(doc)
    }
}

fn reject_hidden(data: &FilterData, hidden: &[&str]) -> Result<(), FilterError> {
    match data.referenced_columns().find(|column| hidden.contains(column)) {
        Some(column) => Err(FilterError::HiddenColumn(column.to_string())),
        None => Ok(()),
    }
}

fn strip_fields(doc: &mut Document, fields: &[&str]) {
    for field in fields {
        doc.remove(*field);
    }
}

/// Keeps only `select` plus `id`; an empty selection keeps everything.
fn project<S: AsRef<str>>(doc: &mut Document, select: &[S]) {
    if select.is_empty() {
        return;
    }
    doc.retain(|key, _| key == "id" || select.iter().any(|s| s.as_ref() == key));
}

fn reference_ids(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => vec![],
    }
}
