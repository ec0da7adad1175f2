use serde::Serialize;
use serde_json::Value;

/// Comparison operators reachable from list-endpoint query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    /// Maps a bracket suffix (`salary[gte]`) to an operator.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "in" => FilterOp::In,
            _ => return None,
        })
    }

    pub fn is_range(&self) -> bool {
        matches!(self, FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte)
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq | FilterOp::In => "=",
            FilterOp::Ne => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// A single field condition. `data` is a string for equality, an array of
/// strings for `In`, and a number or string for range operators.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

impl FilterWhereInfo {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator: FilterOp::Eq,
            data: Value::String(value.into()),
        }
    }

    pub fn any_of<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            operator: FilterOp::In,
            data: Value::Array(values.into_iter().map(|v| Value::String(v.into())).collect()),
        }
    }

    /// Range operand: numeric when the raw text parses as a number.
    pub fn range(column: impl Into<String>, operator: FilterOp, raw: &str) -> Self {
        let data = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string()));
        Self {
            column: column.into(),
            operator,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

impl FilterOrderInfo {
    pub fn newest_first() -> Self {
        Self {
            column: "createdAt".to_string(),
            sort: SortDirection::Desc,
        }
    }
}

/// Everything a list request asked for, parsed out of its query string.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterData {
    pub select: Vec<String>,
    pub where_clause: Vec<FilterWhereInfo>,
    pub order: Vec<FilterOrderInfo>,
    pub page: u32,
    pub limit: u32,
}

impl FilterData {
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Names every field the request touches, for hidden-field checks.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.select
            .iter()
            .map(String::as_str)
            .chain(self.where_clause.iter().map(|w| w.column.as_str()))
            .chain(self.order.iter().map(|o| o.column.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn compute(page: u32, limit: u32, total: u64) -> Self {
        let start = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let end = u64::from(page) * u64::from(limit);

        Self {
            next: (end < total).then(|| PageRef { page: page + 1, limit }),
            prev: (start > 0).then(|| PageRef { page: page - 1, limit }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn range_operand_is_numeric_when_possible() {
        assert_eq!(FilterWhereInfo::range("salary", FilterOp::Gte, "50000").data, json!(50000.0));
        assert_eq!(FilterWhereInfo::range("hireDate", FilterOp::Lt, "2024-01-01").data, json!("2024-01-01"));
    }

    #[test]
    fn pagination_first_middle_last() {
        assert_eq!(Pagination::compute(1, 10, 25).next, Some(PageRef { page: 2, limit: 10 }));
        assert_eq!(Pagination::compute(1, 10, 25).prev, None);

        let middle = Pagination::compute(2, 10, 25);
        assert_eq!(middle.next, Some(PageRef { page: 3, limit: 10 }));
        assert_eq!(middle.prev, Some(PageRef { page: 1, limit: 10 }));

        let last = Pagination::compute(3, 10, 25);
        assert_eq!(last.next, None);
        assert_eq!(last.prev, Some(PageRef { page: 2, limit: 10 }));
    }

    #[test]
    fn pagination_serializes_only_present_links() {
        let value = serde_json::to_value(Pagination::compute(2, 1, 2)).unwrap();
        assert_eq!(value, json!({ "prev": { "page": 1, "limit": 1 } }));
        assert_eq!(serde_json::to_value(Pagination::compute(1, 25, 3)).unwrap(), json!({}));
    }
}
