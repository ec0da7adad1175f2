use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::auth::{RequestContext, NOT_AUTHORIZED};
use crate::error::ApiError;
use crate::models::{Account, Category};

/// The categories a route admits. Admins pass every permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit(pub &'static [Category]);

impl Permit {
    pub const ADMIN_ONLY: Permit = Permit(&[]);
    pub const MANAGERS: Permit = Permit(&[Category::Manager]);

    pub fn allows(&self, account: &Account) -> bool {
        account.is_admin() || account.category.map_or(false, |c| self.0.contains(&c))
    }
}

/// Route layer enforcing a [`Permit`]; attach with
/// `handler.layer(from_fn_with_state(Permit::MANAGERS, require_permit))`.
pub async fn require_permit(State(permit): State<Permit>, request: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))?;

    if !permit.allows(&ctx.account) {
        warn!("Account {} denied by {:?} on {}", ctx.account_id(), permit, request.uri().path());
        return Err(ApiError::forbidden(format!(
            "User role {:?} is not authorized to access this route",
            ctx.account.role
        )));
    }

    Ok(next.run(request).await)
}
