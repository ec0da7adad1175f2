//! Stored entities and their validation rules.

pub mod account;
pub mod announcement;
pub mod leave;
pub mod task;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

pub use account::{Account, Category, Role};
pub use announcement::Announcement;
pub use leave::{Leave, LeaveStatus};
pub use task::{normalize_assignees, Task, TaskStatus};

/// Parse a client date (`2024-03-01` or RFC 3339) into the stored RFC 3339
/// UTC form, which sorts and range-compares correctly as text.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
