use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldError};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Request body accepted as JSON, urlencoded form, or multipart form.
///
/// Form values arrive as strings; repeated keys (and `key[]`) collect into
/// arrays. Multipart file parts are kept aside as [`UploadedFile`]s.
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    fields: Map<String, Value>,
    files: Vec<UploadedFile>,
}

impl FormPayload {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields, files: Vec::new() }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Trimmed, non-empty text; numbers and booleans are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        let text = match self.value(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, FieldError> {
        let parsed = match self.value(key) {
            None => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        parsed
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| FieldError::new(key, format!("{} must be a number", key)))
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, FieldError> {
        match self.number(key)? {
            Some(n) if n.fract() == 0.0 => Ok(Some(n as i64)),
            Some(_) => Err(FieldError::new(key, format!("{} must be a whole number", key))),
            None => Ok(None),
        }
    }

    /// A list given as an array, a JSON-array string, or comma-separated text.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let items = match self.value(key)? {
            Value::Array(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            Value::String(s) => match serde_json::from_str::<Vec<String>>(s.trim()) {
                Ok(items) => items,
                Err(_) => s.split(',').map(str::to_string).collect(),
            },
            _ => return None,
        };
        Some(
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k.as_str())
            .chain(self.files.iter().map(|f| f.field.as_str()))
    }

    fn push_text(&mut self, key: String, value: String) {
        let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
        match self.fields.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                self.fields.insert(key, Value::String(value));
            }
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut payload = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e.body_text())))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name.is_empty() {
                continue;
            }

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e.body_text())))?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    payload.files.push(UploadedFile { field: name, file_name, content_type, bytes });
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e.body_text())))?;
                payload.push_text(name, text);
            }
        }
        Ok(payload)
    }

    fn from_urlencoded(body: &[u8]) -> Self {
        let mut payload = Self::default();
        for (key, value) in url::form_urlencoded::parse(body).into_owned() {
            payload.push_text(key, value);
        }
        payload
    }

    fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self::from_fields(fields)),
            Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
            Err(e) => Err(ApiError::bad_request(format!("Invalid JSON body: {}", e))),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for FormPayload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        if content_type.starts_with("application/x-www-form-urlencoded") {
            Ok(Self::from_urlencoded(&body))
        } else {
            Self::from_json(&body)
        }
    }
}
