use axum::{
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::filter::Pagination;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data,
            status_code: Some(StatusCode::CREATED),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);
        match serde_json::to_value(&self.data) {
            Ok(data) => (status, Json(json!({ "success": true, "data": data }))).into_response(),
            Err(e) => serialization_failure(e),
        }
    }
}

/// List envelope: `{ success, count, pagination, data }` where `count` is
/// the number of records in this page.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self) {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(e) => serialization_failure(e),
        }
    }
}

fn serialization_failure(e: serde_json::Error) -> Response {
    tracing::error!("Failed to serialize response data: {}", e);
    crate::error::ApiError::internal_server_error("Failed to serialize response data").into_response()
}

/// Headers that keep browsers and proxies from caching personnel data.
pub fn no_cache_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        (header::PRAGMA, "no-cache"),
        (header::EXPIRES, "0"),
    ]
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
