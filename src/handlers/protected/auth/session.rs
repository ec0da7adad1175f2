use axum::response::IntoResponse;
use serde_json::json;
use tracing::info;

use crate::handlers::public::auth::cleared_session_cookie;
use crate::handlers::utils::public_view;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::store::Document;

/// GET /api/v1/auth/me - The account behind the presented token
pub async fn me(ctx: RequestContext) -> ApiResult<Document> {
    Ok(ApiResponse::success(public_view(&ctx.account)?))
}

/// GET /api/v1/auth/logout - Clear the session cookie
///
/// Tokens are stateless, so a bearer token stays valid until it expires.
pub async fn logout(ctx: RequestContext) -> impl IntoResponse {
    info!("Account {} signed out", ctx.account_id());
    (cleared_session_cookie(), ApiResponse::success(json!({})))
}
