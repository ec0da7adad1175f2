use crate::config::QueryConfig;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterData, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

const RESERVED: [&str; 4] = ["select", "sort", "page", "limit"];

impl FilterData {
    /// Parse a raw list query string (`?status=Pending&salary[gte]=5&sort=-createdAt&page=2`).
    ///
    /// Reserved keys never become conditions. Unknown bracket operators and
    /// malformed field names are rejected rather than matched literally.
    pub fn from_query(raw: Option<&str>, config: &QueryConfig) -> Result<Self, FilterError> {
        let pairs: Vec<(String, String)> = raw
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let mut select = Vec::new();
        let mut order = Vec::new();
        let mut page = None;
        let mut limit = None;
        let mut grouped: Vec<(String, FilterOp, Vec<String>)> = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "select" => select.extend(parse_select(&value)?),
                "sort" => order.extend(parse_sort(&value)?),
                "page" => page = parse_positive(&value),
                "limit" => limit = parse_positive(&value),
                _ => {
                    let (column, operator) = parse_key(&key)?;
                    match grouped.iter_mut().find(|(c, op, _)| *c == column && *op == operator) {
                        Some((_, _, values)) => values.push(value),
                        None => grouped.push((column, operator, vec![value])),
                    }
                }
            }
        }

        if order.is_empty() {
            order.push(FilterOrderInfo::newest_first());
        }

        let page = page.unwrap_or(1);
        let mut limit = limit.unwrap_or(config.default_limit.max(1));
        if let Some(max_limit) = config.max_limit {
            if limit > max_limit {
                if config.debug_logging {
                    tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
                }
                limit = max_limit;
            }
        }

        Ok(Self {
            select,
            where_clause: grouped.into_iter().flat_map(|(c, op, v)| build_conditions(c, op, v)).collect(),
            order,
            page,
            limit,
        })
    }
}

fn parse_key(key: &str) -> Result<(String, FilterOp), FilterError> {
    let (column, operator) = match key.find('[') {
        Some(open) => {
            let suffix = key[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| FilterError::InvalidColumn(key.to_string()))?;
            let operator = FilterOp::from_suffix(suffix)
                .ok_or_else(|| FilterError::UnsupportedOperator(suffix.to_string()))?;
            (&key[..open], operator)
        }
        None => (key, FilterOp::Eq),
    };
    Filter::validate_column(column)?;
    Ok((column.to_string(), operator))
}

fn build_conditions(column: String, operator: FilterOp, values: Vec<String>) -> Vec<FilterWhereInfo> {
    match operator {
        // Repeated plain keys behave like `[in]`
        FilterOp::Eq if values.len() > 1 => vec![FilterWhereInfo::any_of(column, values)],
        FilterOp::Eq | FilterOp::Ne => values
            .into_iter()
            .map(|v| FilterWhereInfo {
                column: column.clone(),
                operator,
                data: serde_json::Value::String(v),
            })
            .collect(),
        FilterOp::In => {
            let items: Vec<String> = values
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            vec![FilterWhereInfo::any_of(column, items)]
        }
        _ => values
            .iter()
            .map(|v| FilterWhereInfo::range(column.clone(), operator, v))
            .collect(),
    }
}

fn parse_select(value: &str) -> Result<Vec<String>, FilterError> {
    let columns: Vec<String> = value
        .split(|c| c == ',' || c == ' ')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    for column in &columns {
        Filter::validate_column(column)?;
    }
    Ok(columns)
}

fn parse_sort(value: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
    let mut out = Vec::new();
    for part in value.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (column, sort) = match trimmed.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (trimmed.trim_start_matches('+'), SortDirection::Asc),
        };
        Filter::validate_column(column)?;
        out.push(FilterOrderInfo { column: column.to_string(), sort });
    }
    Ok(out)
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
