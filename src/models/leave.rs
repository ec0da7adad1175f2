use serde::{Deserialize, Serialize};

use super::{is_blank, normalize_date};
use crate::error::FieldError;
use crate::store::{Meta, Model};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Only decisions are accepted as a new status.
    pub fn parse_decision(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Approved" => Some(LeaveStatus::Approved),
            "Rejected" => Some(LeaveStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub employee: String,
    #[serde(default)]
    pub leave_type: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

impl Leave {
    /// Records a decision. The approver is set in the same step as the
    /// status so one never appears without the other.
    pub fn decide(&mut self, status: LeaveStatus, approver: &str) {
        self.status = status;
        self.approved_by = Some(approver.to_string());
    }
}

impl Model for Leave {
    const COLLECTION: &'static str = "leaves";
    const LABEL: &'static str = "Leave request";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if is_blank(&self.employee) {
            errors.push(FieldError::new("employee", "Employee is required"));
        }
        if is_blank(&self.leave_type) {
            errors.push(FieldError::new("leaveType", "Leave type is required"));
        }

        let start = normalize_date(&self.start_date);
        let end = normalize_date(&self.end_date);
        if start.is_none() {
            errors.push(FieldError::new("startDate", "Start date must be a valid date"));
        }
        if end.is_none() {
            errors.push(FieldError::new("endDate", "End date must be a valid date"));
        }
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                errors.push(FieldError::new("endDate", "End date cannot be before start date"));
            }
        }

        match (self.status, &self.approved_by) {
            (LeaveStatus::Pending, Some(_)) => {
                errors.push(FieldError::new("approvedBy", "A pending request has no approver"))
            }
            (LeaveStatus::Approved | LeaveStatus::Rejected, None) => {
                errors.push(FieldError::new("approvedBy", "A decided request needs an approver"))
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
