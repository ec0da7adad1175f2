use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereInfo, SqlResult};

/// Table holding every collection; documents live in its `data` JSONB column.
pub const DOCUMENTS_TABLE: &str = "documents";

/// Conditions, ordering, and a page window for one collection query.
///
/// Backends read the same `Filter`: Postgres through [`Filter::to_sql`], the
/// memory store through [`Filter::matches`](super::filter_match).
#[derive(Debug, Clone, Default)]
pub struct Filter {
    where_data: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the request's conditions, ordering, and page window.
    pub fn assign(&mut self, data: &FilterData) -> Result<&mut Self, FilterError> {
        self.where_clause(data.where_clause.iter().cloned())?;
        self.order(data.order.clone())?;
        self.limit(data.limit, Some(data.offset()))?;
        Ok(self)
    }

    /// Adds conditions; they combine with existing ones by AND.
    pub fn where_clause<I>(&mut self, conditions: I) -> Result<&mut Self, FilterError>
    where
        I: IntoIterator<Item = FilterWhereInfo>,
    {
        for condition in conditions {
            Self::validate_column(&condition.column)?;
            FilterWhere::validate(&condition)?;
            self.where_data.push(condition);
        }
        Ok(self)
    }

    pub fn order(&mut self, order: Vec<FilterOrderInfo>) -> Result<&mut Self, FilterError> {
        for info in &order {
            Self::validate_column(&info.column)?;
        }
        self.order_data = order;
        Ok(self)
    }

    pub fn limit(&mut self, limit: u32, offset: Option<u32>) -> Result<&mut Self, FilterError> {
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.where_data
    }

    pub fn order_info(&self) -> &[FilterOrderInfo] {
        &self.order_data
    }

    pub fn window(&self) -> (usize, Option<usize>) {
        (
            self.offset.unwrap_or(0) as usize,
            self.limit.map(|l| l as usize),
        )
    }

    pub fn to_sql(&self, collection: &str) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(collection)?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT \"data\" FROM \"{}\"", DOCUMENTS_TABLE),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    /// WHERE body scoped to `collection`, which is always bound as `$1`.
    pub fn to_where_sql(&self, collection: &str) -> Result<SqlResult, FilterError> {
        Self::validate_collection(collection)?;
        let (conditions, mut params) = FilterWhere::generate(&self.where_data, 1)?;
        params.insert(0, serde_json::Value::String(collection.to_string()));

        let query = if conditions.is_empty() {
            "\"collection\" = $1".to_string()
        } else {
            format!("\"collection\" = $1 AND {}", conditions)
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self, collection: &str) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(collection)?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
            DOCUMENTS_TABLE, where_result.query
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    /// Field names are spliced into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` passes.
    pub fn validate_column(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidColumn("Field name cannot be empty".to_string()));
        }
        if !Self::is_identifier(name) {
            return Err(FilterError::InvalidColumn(format!("Invalid field name format: {}", name)));
        }
        Ok(())
    }

    fn validate_collection(name: &str) -> Result<(), FilterError> {
        if name.is_empty() || !Self::is_identifier(name) {
            return Err(FilterError::InvalidCollection(name.to_string()));
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
