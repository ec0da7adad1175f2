use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{is_blank, normalize_date};
use crate::error::FieldError;
use crate::store::{Meta, Model};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Completed,
    Reviewed,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Pending" => Some(TaskStatus::Pending),
            "In Progress" | "InProgress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            "Reviewed" => Some(TaskStatus::Reviewed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub assigned_by: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_file: Option<String>,
}

impl Task {
    pub fn is_assignee(&self, account_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == account_id)
    }
}

impl Model for Task {
    const COLLECTION: &'static str = "tasks";
    const LABEL: &'static str = "Task";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if is_blank(&self.title) {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if is_blank(&self.description) {
            errors.push(FieldError::new("description", "Description is required"));
        }
        if self.assigned_to.is_empty() {
            errors.push(FieldError::new("assignedTo", "At least one assignee is required"));
        }
        if is_blank(&self.assigned_by) {
            errors.push(FieldError::new("assignedBy", "Assigner is required"));
        }
        if is_blank(&self.deadline) {
            errors.push(FieldError::new("deadline", "Deadline is required"));
        } else if normalize_date(&self.deadline).is_none() {
            errors.push(FieldError::new("deadline", "Deadline must be a valid date"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Accepts an id string, a JSON-array string, or an array, and returns the
/// de-duplicated ids in first-seen order. Every id must be a UUID.
pub fn normalize_assignees(raw: &Value) -> Result<Vec<String>, FieldError> {
    let candidates: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Array(items)) => items,
            Ok(Value::String(single)) => vec![Value::String(single)],
            _ => vec![Value::String(s.clone())],
        },
        Value::Null => vec![],
        other => vec![other.clone()],
    };

    let mut ids: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let id = match &candidate {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if Uuid::parse_str(&id).is_err() {
            return Err(FieldError::new("assignedTo", format!("Invalid assignedTo ID: {}", id)));
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(FieldError::new("assignedTo", "At least one assignee is required"));
    }
    Ok(ids)
}
