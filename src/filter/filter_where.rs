use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders field conditions against the `data` JSONB column.
///
/// Equality compares text forms (`->>`) and also matches array fields that
/// contain the value. Range operators compare as float8 when the operand is
/// numeric and the stored value is a JSON number, bytewise text otherwise.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = Vec::with_capacity(conditions.len());
        for condition in conditions {
            sql_conditions.push(filter_where.build_sql_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), filter_where.param_values))
    }

    pub fn validate(condition: &FilterWhereInfo) -> Result<(), FilterError> {
        match (&condition.operator, &condition.data) {
            (FilterOp::Eq | FilterOp::Ne, Value::String(_)) => Ok(()),
            (FilterOp::In, Value::Array(values)) if values.iter().all(Value::is_string) => Ok(()),
            (op, Value::String(_) | Value::Number(_)) if op.is_range() => Ok(()),
            (op, _) => Err(FilterError::InvalidOperatorData(format!(
                "{:?} on '{}' has an unsupported operand",
                op, condition.column
            ))),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        Self::validate(condition)?;
        let column = &condition.column;

        Ok(match condition.operator {
            FilterOp::Eq => self.equality(column, condition.data.clone()),
            FilterOp::Ne => {
                let eq = self.equality(column, condition.data.clone());
                format!("NOT COALESCE({}, false)", eq)
            }
            FilterOp::In => {
                let values = condition.data.as_array().cloned().unwrap_or_default();
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let parts: Vec<String> = values.into_iter().map(|v| self.equality(column, v)).collect();
                format!("({})", parts.join(" OR "))
            }
            op => match &condition.data {
                Value::Number(_) => {
                    let param = self.param(condition.data.clone());
                    format!(
                        "(CASE WHEN jsonb_typeof(\"data\"->'{col}') = 'number' THEN (\"data\"->>'{col}')::float8 {op} {param} ELSE false END)",
                        col = column,
                        op = op.to_sql(),
                        param = param
                    )
                }
                _ => {
                    let param = self.param(condition.data.clone());
                    format!("(\"data\"->>'{}' COLLATE \"C\") {} {}", column, op.to_sql(), param)
                }
            },
        })
    }

    fn equality(&mut self, column: &str, value: Value) -> String {
        let param = self.param(value);
        format!(
            "(\"data\"->>'{col}' = {param} OR \"data\"->'{col}' @> jsonb_build_array({param}::text))",
            col = column,
            param = param
        )
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_parameters_after_the_starting_index() {
        let (sql, params) = FilterWhere::generate(
            &[
                FilterWhereInfo::eq("status", "Pending"),
                FilterWhereInfo::range("salary", FilterOp::Gte, "50000"),
            ],
            1,
        )
        .unwrap();

        assert!(sql.contains("\"data\"->>'status' = $2"));
        assert!(sql.contains("jsonb_build_array($2::text)"));
        assert!(sql.contains("(\"data\"->>'salary')::float8 >= $3"));
        assert_eq!(params, vec![json!("Pending"), json!(50000.0)]);
    }

    #[test]
    fn in_expands_to_disjunction_and_empty_in_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&[FilterWhereInfo::any_of("assignedTo", ["a", "b"])], 0).unwrap();
        assert!(sql.starts_with('('));
        assert!(sql.contains(" OR "));
        assert_eq!(params.len(), 2);

        let empty: [&str; 0] = [];
        let (sql, params) = FilterWhere::generate(&[FilterWhereInfo::any_of("assignedTo", empty)], 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn text_ranges_use_bytewise_collation() {
        let (sql, _) = FilterWhere::generate(&[FilterWhereInfo::range("hireDate", FilterOp::Lt, "2024-01-01")], 0).unwrap();
        assert_eq!(sql, "(\"data\"->>'hireDate' COLLATE \"C\") < $1");
    }

    #[test]
    fn not_equal_tolerates_missing_fields() {
        let (sql, _) = FilterWhere::generate(
            &[FilterWhereInfo { column: "category".into(), operator: FilterOp::Ne, data: json!("Staff") }],
            0,
        )
        .unwrap();
        assert!(sql.starts_with("NOT COALESCE("));
    }

    #[test]
    fn mismatched_operands_are_rejected() {
        let bad = FilterWhereInfo { column: "status".into(), operator: FilterOp::In, data: json!("Pending") };
        assert!(matches!(FilterWhere::validate(&bad), Err(FilterError::InvalidOperatorData(_))));
    }
}
