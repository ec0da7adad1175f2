// handlers/utils.rs - Input helpers shared by the resource handlers

use uuid::Uuid;

use crate::error::{ApiError, FieldError};
use crate::middleware::FormPayload;
use crate::models::{normalize_date, Category};
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::store::{Document, Model, StoreError};

pub fn validation_failed(errors: Vec<FieldError>) -> ApiError {
    ApiError::validation_error("Validation failed", Some(errors))
}

/// Collects field failures so a single 400 reports all of them. The first
/// error recorded for a field wins.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn take<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    pub fn push(&mut self, error: FieldError) {
        if !self.0.iter().any(|e| e.field == error.field) {
            self.0.push(error);
        }
    }

    pub fn extend(&mut self, result: Result<(), Vec<FieldError>>) {
        if let Err(errors) = result {
            for error in errors {
                self.push(error);
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(validation_failed(self.0))
        }
    }
}

/// Password fields are taken verbatim, without trimming.
pub fn password_field(form: &FormPayload, key: &str) -> Option<String> {
    form.value(key)
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

pub fn date_field(form: &FormPayload, key: &str) -> Result<Option<String>, FieldError> {
    match form.text(key) {
        Some(raw) => normalize_date(&raw)
            .map(Some)
            .ok_or_else(|| FieldError::new(key, format!("{} must be a valid date", key))),
        None => Ok(None),
    }
}

pub fn category_field(form: &FormPayload) -> Result<Option<Category>, FieldError> {
    match form.text("category") {
        Some(raw) => Category::parse(&raw)
            .map(Some)
            .ok_or_else(|| FieldError::new("category", "Category must be Manager, Supervisor or Staff")),
        None => Ok(None),
    }
}

/// `"Ada King Lovelace"` splits into `("Ada", "King Lovelace")`.
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// De-duplicated account ids; every entry must be a UUID.
pub fn id_list(field: &str, items: Vec<String>) -> Result<Vec<String>, FieldError> {
    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for id in items {
        if Uuid::parse_str(&id).is_err() {
            return Err(FieldError::new(field, format!("Invalid {} ID: {}", field, id)));
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// 400 naming the first id in `ids` that has no account behind it.
pub async fn ensure_accounts_exist(state: &AppState, field: &str, ids: &[String]) -> Result<(), ApiError> {
    let found = state.accounts().select_ids(ids).await?;
    match ids.iter().find(|id| !found.iter().any(|account| account.id() == id.as_str())) {
        Some(missing) => Err(validation_failed(vec![FieldError::new(
            field,
            format!("No employee found with id of {}", missing),
        )])),
        None => Ok(()),
    }
}

/// Stores the file sent under `field`, if any, and returns its URL path.
pub async fn store_upload(
    state: &AppState,
    form: &mut FormPayload,
    field: &str,
    kind: UploadKind,
) -> Result<Option<String>, ApiError> {
    let Some(file) = form.take_file(field) else {
        return Ok(None);
    };
    let url = state
        .objects
        .put(kind, file.file_name.as_deref(), &file.bytes)
        .await?;
    Ok(Some(url))
}

pub fn public_view<T: Model>(record: &T) -> Result<Document, ApiError> {
    Ok(record.to_public().map_err(StoreError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    #[test]
    fn names_split_on_first_space() {
        assert_eq!(split_name("Ada King Lovelace"), ("Ada".to_string(), "King Lovelace".to_string()));
        assert_eq!(split_name("  Grace  "), ("Grace".to_string(), String::new()));
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::default();
        errors.push(FieldError::new("email", "Email is required"));
        errors.extend(Err(vec![
            FieldError::new("email", "Please add a valid email"),
            FieldError::new("phone", "Phone is required"),
        ]));
        let err = errors.finish().unwrap_err();
        let body = err.to_json();
        assert_eq!(body["fields"].as_array().unwrap().len(), 2);
        assert_eq!(body["fields"][0]["message"], "Email is required");
    }

    #[test]
    fn id_lists_dedupe_and_reject_non_uuids() {
        assert_eq!(id_list("team", vec![A.to_string(), A.to_string()]).unwrap(), vec![A.to_string()]);
        assert_eq!(id_list("team", vec!["bob".to_string()]).unwrap_err().field, "team");
    }

    #[test]
    fn dates_are_normalized_or_reported() {
        let form = FormPayload::from_fields(
            serde_json::json!({ "hireDate": "2023-04-01", "deadline": "soon" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(date_field(&form, "hireDate").unwrap().as_deref(), Some("2023-04-01T00:00:00.000Z"));
        assert_eq!(date_field(&form, "deadline").unwrap_err().field, "deadline");
        assert_eq!(date_field(&form, "missing").unwrap(), None);
    }
}
