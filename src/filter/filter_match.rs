use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::filter::Filter;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

/// In-process evaluation of a [`Filter`], mirroring the SQL the Postgres
/// backend generates so both stores answer list queries the same way.
impl Filter {
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        self.conditions().iter().all(|c| condition_matches(c, doc))
    }

    pub fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        compare_by(self.order_info(), a, b)
    }
}

pub fn compare_by(order: &[FilterOrderInfo], a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    for info in order {
        let ord = compare_values(a.get(&info.column), b.get(&info.column));
        let ord = match info.sort {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn condition_matches(condition: &FilterWhereInfo, doc: &Map<String, Value>) -> bool {
    let field = doc.get(&condition.column);
    match condition.operator {
        FilterOp::Eq => condition.data.as_str().map_or(false, |v| text_equals(field, v)),
        FilterOp::Ne => !condition.data.as_str().map_or(false, |v| text_equals(field, v)),
        FilterOp::In => condition
            .data
            .as_array()
            .map_or(false, |values| values.iter().filter_map(Value::as_str).any(|v| text_equals(field, v))),
        op => range_matches(op, field, &condition.data),
    }
}

fn text_equals(field: Option<&Value>, expected: &str) -> bool {
    match field {
        Some(Value::Array(items)) => {
            text_form(field).as_deref() == Some(expected) || items.iter().any(|item| item.as_str() == Some(expected))
        }
        other => text_form(other).as_deref() == Some(expected),
    }
}

fn range_matches(op: FilterOp, field: Option<&Value>, operand: &Value) -> bool {
    let ordering = match operand {
        Value::Number(n) => match (field.and_then(Value::as_f64), n.as_f64()) {
            (Some(left), Some(right)) => left.partial_cmp(&right),
            _ => None,
        },
        Value::String(s) => text_form(field).map(|left| left.as_str().cmp(s.as_str())),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        FilterOp::Gt => ordering == Ordering::Greater,
        FilterOp::Gte => ordering != Ordering::Less,
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::Lte => ordering != Ordering::Greater,
        _ => false,
    }
}

/// Text a field yields under `->>`; JSON null and missing fields have none.
fn text_form(field: Option<&Value>) -> Option<String> {
    match field? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// null < string < number < bool < array < object < missing
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Null) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::Bool(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
        None => 6,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y)) if type_rank(Some(x)) == type_rank(Some(y)) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
