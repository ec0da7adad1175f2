// handlers/public/auth/mod.rs - Token acquisition endpoints (no authentication)

use axum::{
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::auth::{generate_jwt, IssuedToken};
use crate::config::Environment;
use crate::error::ApiError;
use crate::handlers::utils::public_view;
use crate::middleware::ApiResponse;
use crate::models::Account;
use crate::state::AppState;
use crate::store::Model;

pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;

pub const SESSION_COOKIE: &str = "token";

/// Issues a token for `account` and answers with
/// `{ token, expiresIn, account }` plus the session cookie.
pub fn token_response(state: &AppState, account: &Account, status: StatusCode) -> Result<Response, ApiError> {
    let issued = generate_jwt(account.id(), &state.config.security)?;
    let secure = state.config.environment == Environment::Production;
    let cookie = session_cookie(&issued, secure);

    let body = json!({
        "token": issued.token,
        "expiresIn": issued.expires_in,
        "account": public_view(account)?,
    });
    let body = if status == StatusCode::CREATED {
        ApiResponse::created(body)
    } else {
        ApiResponse::success(body)
    };
    Ok(([(SET_COOKIE, cookie)], body).into_response())
}

pub fn session_cookie(issued: &IssuedToken, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, issued.token, issued.expires_in
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn cleared_session_cookie() -> [(HeaderName, String); 1] {
    [(
        SET_COOKIE,
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE),
    )]
}
