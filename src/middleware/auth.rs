use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::validate_jwt;
use crate::error::ApiError;
use crate::models::Account;
use crate::state::AppState;

pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// The signed-in account, resolved once per request by
/// [`jwt_auth_middleware`] and read by handlers as an extractor.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub account: Account,
}

impl RequestContext {
    pub fn account_id(&self) -> &str {
        &self.account.meta.id
    }

    pub fn is_admin(&self) -> bool {
        self.account.is_admin()
    }

    pub fn is_manager(&self) -> bool {
        self.account.is_manager()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))
    }
}

/// Verifies the bearer token and attaches the account it names. Every
/// failure answers with the same 401 so callers learn nothing about why.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(|reason| {
        warn!("Rejected request to {}: {}", request.uri().path(), reason);
        ApiError::unauthorized(NOT_AUTHORIZED)
    })?;

    let claims = validate_jwt(&token, &state.config.security).map_err(|e| {
        warn!("Rejected request to {}: {}", request.uri().path(), e);
        ApiError::unauthorized(NOT_AUTHORIZED)
    })?;

    let account = state.accounts().find_by_id(&claims.id).await?.ok_or_else(|| {
        warn!("Token names unknown account {}", claims.id);
        ApiError::unauthorized(NOT_AUTHORIZED)
    })?;

    request.extensions_mut().insert(RequestContext { account });
    Ok(next.run(request).await)
}

fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers.get(AUTHORIZATION).ok_or("missing Authorization header")?;
    let auth_str = auth_header.to_str().map_err(|_| "invalid Authorization header")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("empty bearer token"),
        None => Err("Authorization header must use the Bearer scheme"),
    }
}
