// handlers/public/auth/register.rs - POST /api/v1/auth/register

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::{info, warn};

use super::token_response;
use crate::auth::hash_password;
use crate::error::{ApiError, FieldError};
use crate::handlers::utils::{category_field, date_field, password_field, store_upload, FieldErrors};
use crate::middleware::FormPayload;
use crate::models::{Account, Role};
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::store::Model;

/// POST /api/v1/auth/register - Create an account and sign it in
///
/// Accepts JSON, urlencoded or multipart bodies; a multipart `profileImage`
/// file becomes the profile picture. Non-Admin accounts must carry
/// `category`, `phone`, `department`, `salary` and `hireDate`.
pub async fn register_post(State(state): State<AppState>, mut form: FormPayload) -> Result<Response, ApiError> {
    let mut errors = FieldErrors::default();

    let role = match form.text("role") {
        Some(raw) => errors
            .take(Role::parse(&raw).ok_or_else(|| FieldError::new("role", "Role must be Admin or Employee")))
            .unwrap_or_default(),
        None => Role::Employee,
    };
    if role == Role::Admin && !state.config.security.allow_admin_registration {
        warn!("Refused Admin self-registration for {:?}", form.text("email"));
        return Err(ApiError::forbidden("Admin registration is disabled"));
    }

    let password = password_field(&form, "password").unwrap_or_default();
    if !password.is_empty() {
        errors.take(Account::validate_plain_password(&password));
    }

    let draft = Account {
        first_name: form.text("firstName").unwrap_or_default(),
        last_name: form.text("lastName").unwrap_or_default(),
        email: form.text("email").map(|e| Account::normalize_email(&e)).unwrap_or_default(),
        password: password.clone(),
        role,
        category: errors.take(category_field(&form)).flatten(),
        phone: form.text("phone"),
        department: form.text("department"),
        salary: errors.take(form.number("salary")).flatten(),
        hire_date: errors.take(date_field(&form, "hireDate")).flatten(),
        ..Account::default()
    };
    errors.extend(draft.validate());
    errors.finish()?;

    let profile_picture = store_upload(&state, &mut form, "profileImage", UploadKind::ProfileImage).await?;
    let account = Account {
        password: hash_password(&password, state.config.security.bcrypt_cost).await?,
        profile_picture: profile_picture.unwrap_or_else(|| draft.profile_picture.clone()),
        ..draft
    };

    let account = state.accounts().create(account).await?;
    info!("Registered account {} as {:?}", account.id(), account.role);

    token_response(&state, &account, StatusCode::CREATED)
}
