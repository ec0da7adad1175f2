// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

/// One structured validation failure, reported back to the client as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<Vec<FieldError>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["fields"] = json!(field_errors);
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<Vec<FieldError>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;

        match err {
            StoreError::Validation(field_errors) => {
                ApiError::validation_error("Validation failed", Some(field_errors))
            }
            StoreError::Duplicate(field) => {
                ApiError::validation_error(
                    "Duplicate field value entered",
                    Some(vec![FieldError::new(field, "Value is already in use")]),
                )
            }
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Filter(filter_err) => filter_err.into(),
            StoreError::Serialization(e) => {
                tracing::error!("Document serialization error: {}", e);
                ApiError::internal_server_error("Failed to process stored data")
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            StoreError::Unavailable(msg) => {
                tracing::error!("Document store unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
        }
    }
}

impl From<crate::filter::error::FilterError> for ApiError {
    fn from(err: crate::filter::error::FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<crate::ai::AiError> for ApiError {
    fn from(err: crate::ai::AiError) -> Self {
        use crate::ai::AiError;

        match err {
            AiError::Unavailable => ApiError::service_unavailable("AI service unavailable"),
            AiError::InvalidResponse(raw) => {
                tracing::error!("Failed to parse AI response as JSON: {}", raw);
                ApiError::internal_server_error("Invalid response from AI service")
            }
            AiError::Transport(msg) | AiError::Upstream(msg) => {
                tracing::error!("AI provider error: {}", msg);
                ApiError::internal_server_error("AI service request failed")
            }
        }
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        use crate::storage::StorageError;

        match err {
            StorageError::TooLarge { limit } => {
                ApiError::bad_request(format!("File too large. Maximum size is {} bytes", limit))
            }
            StorageError::UnsupportedType { extension, allowed } => ApiError::bad_request(format!(
                "Unsupported file type .{}. Allowed types: {}",
                extension,
                allowed.join(", ")
            )),
            StorageError::Io(e) => {
                tracing::error!("Object storage write failed: {}", e);
                ApiError::internal_server_error("Failed to store uploaded file")
            }
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        tracing::error!("Token issuance failed: {}", err);
        ApiError::internal_server_error("Failed to issue session token")
    }
}

impl From<crate::auth::PasswordError> for ApiError {
    fn from(err: crate::auth::PasswordError) -> Self {
        tracing::error!("Password hashing failed: {}", err);
        ApiError::internal_server_error("Failed to process credentials")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_success_false_and_message() {
        let err = ApiError::forbidden("nope");
        assert_eq!(err.status_code(), 403);
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "nope");
        assert_eq!(body["code"], "FORBIDDEN");
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn validation_errors_list_fields() {
        let err = ApiError::validation_error("Validation failed", Some(vec![FieldError::new("email", "Email is required")]));
        let body = err.to_json();
        assert_eq!(err.status_code(), 400);
        assert_eq!(body["fields"][0]["field"], "email");
    }

    #[test]
    fn duplicate_store_error_is_a_client_error() {
        let err: ApiError = crate::store::StoreError::Duplicate("email".to_string()).into();
        assert_eq!(err.status_code(), 400);
    }
}
