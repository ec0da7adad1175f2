// handlers/public/auth/login.rs - POST /api/v1/auth/login

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::{info, warn};

use super::token_response;
use crate::auth::{verify_password, DUMMY_HASH};
use crate::error::ApiError;
use crate::filter::{Filter, FilterWhereInfo};
use crate::handlers::utils::password_field;
use crate::middleware::FormPayload;
use crate::models::Account;
use crate::state::AppState;
use crate::store::Model;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// POST /api/v1/auth/login - Exchange email and password for a session token
///
/// Unknown email and wrong password produce the same 401 body.
pub async fn login_post(State(state): State<AppState>, form: FormPayload) -> Result<Response, ApiError> {
    let email = form.text("email").map(|e| Account::normalize_email(&e));
    let password = password_field(&form, "password");
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };

    let mut filter = Filter::new();
    filter.where_clause([FilterWhereInfo::eq("email", email.as_str())])?;

    let Some(account) = state.accounts().select_one(&filter).await? else {
        verify_password(&password, DUMMY_HASH).await?;
        warn!("Login failed: no account for {}", email);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&password, &account.password).await? {
        warn!("Login failed: wrong password for account {}", account.id());
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    info!("Account {} signed in", account.id());
    token_response(&state, &account, StatusCode::OK)
}
