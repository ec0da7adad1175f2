// handlers/public/status.rs - Service banner and health probe

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::error;

use crate::state::AppState;

/// GET / - Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "endpoints": {
                "auth": "/api/v1/auth",
                "employees": "/api/v1/employees",
                "tasks": "/api/v1/tasks",
                "leaves": "/api/v1/leaves",
                "announcements": "/api/v1/announcements",
                "ai": "/api/v1/ai",
                "uploads": "/uploads",
            }
        }
    }))
}

/// GET /health - 200 when the document store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "healthy", "store": "connected" }
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Document store unavailable",
                    "code": "SERVICE_UNAVAILABLE"
                })),
            )
        }
    }
}
