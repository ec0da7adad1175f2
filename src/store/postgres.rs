use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;

use super::{unique_fields, Document, DocumentStore, StoreError, UNIQUE_FIELDS};
use crate::config::DatabaseConfig;
use crate::filter::filter::DOCUMENTS_TABLE;
use crate::filter::Filter;

/// Documents in one JSONB table keyed by `(collection, id)`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected document store (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Creates the documents table plus one partial unique index per unique field.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                \"collection\" TEXT NOT NULL,
                \"id\" TEXT NOT NULL,
                \"data\" JSONB NOT NULL,
                PRIMARY KEY (\"collection\", \"id\")
            )",
            table = DOCUMENTS_TABLE
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let gin_index = format!(
            "CREATE INDEX IF NOT EXISTS \"{table}_data_gin\" ON \"{table}\" USING GIN (\"data\")",
            table = DOCUMENTS_TABLE
        );
        sqlx::query(&gin_index).execute(&self.pool).await?;

        for (collection, field) in UNIQUE_FIELDS {
            let unique_index = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{name}\" ON \"{table}\" ((\"data\"->>'{field}')) WHERE \"collection\" = '{collection}'",
                name = unique_index_name(collection, field),
                table = DOCUMENTS_TABLE,
                field = field,
                collection = collection
            );
            sqlx::query(&unique_index).execute(&self.pool).await?;
        }

        info!("Document store schema is up to date");
        Ok(())
    }

    fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or_default();
                let field = unique_fields(collection)
                    .find(|field| unique_index_name(collection, field) == constraint)
                    .unwrap_or("id");
                return StoreError::Duplicate(field.to_string());
            }
        }
        StoreError::Sqlx(err)
    }
}

fn unique_index_name(collection: &str, field: &str) -> String {
    format!("{}_{}_{}_key", DOCUMENTS_TABLE, collection, field)
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(b.to_string()),
        // Range operands are compared as float8
        Value::Number(n) => q.bind(n.as_f64().unwrap_or_default()),
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(Json(v)),
    }
}

fn decode_document(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    let Json(doc): Json<Document> = row.try_get("data")?;
    Ok(doc)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let sql_result = filter.to_sql(collection)?;
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(decode_document).collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let sql_result = filter.to_count_sql(collection)?;
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "SELECT \"data\" FROM \"{}\" WHERE \"collection\" = $1 AND \"id\" = $2",
            DOCUMENTS_TABLE
        );
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_document).transpose()
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = super::document_id(&doc)
            .ok_or_else(|| StoreError::NotFound("Document has no id".to_string()))?
            .to_string();
        let query = format!(
            "INSERT INTO \"{}\" (\"collection\", \"id\", \"data\") VALUES ($1, $2, $3) RETURNING \"data\"",
            DOCUMENTS_TABLE
        );
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(&id)
            .bind(Json(&doc))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;
        decode_document(&row)
    }

    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "UPDATE \"{}\" SET \"data\" = $3 WHERE \"collection\" = $1 AND \"id\" = $2 RETURNING \"data\"",
            DOCUMENTS_TABLE
        );
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(id)
            .bind(Json(&doc))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;
        row.as_ref().map(decode_document).transpose()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let query = format!(
            "DELETE FROM \"{}\" WHERE \"collection\" = $1 AND \"id\" = $2",
            DOCUMENTS_TABLE
        );
        let result = sqlx::query(&query)
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
