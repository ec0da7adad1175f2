// handlers/protected/employees.rs - Account administration and self-service profile

use axum::{
    extract::{Path, RawQuery, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use crate::auth::hash_password;
use crate::error::{ApiError, FieldError};
use crate::filter::{Filter, FilterWhereInfo};
use crate::handlers::utils::{
    category_field, date_field, ensure_accounts_exist, id_list, password_field, public_view, split_name,
    store_upload, FieldErrors,
};
use crate::middleware::{no_cache_headers, ApiResponse, ApiResult, FormPayload, RequestContext};
use crate::models::{Account, Role};
use crate::services::{ListService, Populate};
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::store::{Document, Model};

/// GET /api/v1/employees - Query-builder listing of every account (Admin)
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<impl IntoResponse, ApiError> {
    let service = ListService::new(state.store.clone(), &state.config.query);
    let page = service.list::<Account>(query.as_deref(), vec![], None).await?;
    Ok((no_cache_headers(), page))
}

/// POST /api/v1/employees - Create an employee account (Admin)
///
/// `name` is split into first and last name. Without `password` the
/// configured default password is used.
pub async fn create(State(state): State<AppState>, mut form: FormPayload) -> ApiResult<Document> {
    let mut errors = FieldErrors::default();

    let (first_name, last_name) = match form.text("name") {
        Some(name) => split_name(&name),
        None => (
            form.text("firstName").unwrap_or_default(),
            form.text("lastName").unwrap_or_default(),
        ),
    };
    let password = password_field(&form, "password")
        .unwrap_or_else(|| state.config.security.default_employee_password.clone());
    errors.take(Account::validate_plain_password(&password));

    let draft = Account {
        first_name,
        last_name,
        email: form.text("email").map(|e| Account::normalize_email(&e)).unwrap_or_default(),
        password: password.clone(),
        role: Role::Employee,
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
    info!("Created employee {} ({})", account.id(), account.email);
    Ok(ApiResponse::created(public_view(&account)?))
}

/// PUT /api/v1/employees/profile - Update the caller's own name, email and picture
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    mut form: FormPayload,
) -> ApiResult<Document> {
    let mut account = ctx.account;

    if let Some(first_name) = form.text("firstName") {
        account.first_name = first_name;
    }
    if let Some(last_name) = form.text("lastName") {
        account.last_name = last_name;
    }
    if let Some(email) = form.text("email") {
        account.email = Account::normalize_email(&email);
    }

    let uploaded = match store_upload(&state, &mut form, "profilePicture", UploadKind::ProfileImage).await? {
        Some(url) => Some(url),
        None => store_upload(&state, &mut form, "profileImage", UploadKind::ProfileImage).await?,
    };
    if let Some(url) = uploaded {
        account.profile_picture = url;
    }

    let account = state.accounts().update(account).await?;
    info!("Account {} updated its profile", account.id());
    Ok(ApiResponse::success(public_view(&account)?))
}

/// GET /api/v1/employees/:id - One account with its team populated (Admin)
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts().select_404(&id).await?;
    let service = ListService::new(state.store.clone(), &state.config.query);
    let doc = service.show(&account, Some(Populate::accounts("team", &[]))).await?;
    Ok((no_cache_headers(), ApiResponse::success(doc)))
}

/// PUT /api/v1/employees/:id - Edit an account, its team and its metrics (Admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut form: FormPayload,
) -> ApiResult<Document> {
    let mut account = state.accounts().select_404(&id).await?;
    let mut errors = FieldErrors::default();

    if let Some(name) = form.text("name") {
        (account.first_name, account.last_name) = split_name(&name);
    }
    if let Some(first_name) = form.text("firstName") {
        account.first_name = first_name;
    }
    if let Some(last_name) = form.text("lastName") {
        account.last_name = last_name;
    }
    if let Some(email) = form.text("email") {
        account.email = Account::normalize_email(&email);
    }
    if let Some(phone) = form.text("phone") {
        account.phone = Some(phone);
    }
    if let Some(department) = form.text("department") {
        account.department = Some(department);
    }
    if let Some(raw) = form.text("role") {
        match Role::parse(&raw) {
            Some(role) => account.role = role,
            None => errors.push(FieldError::new("role", "Role must be Admin or Employee")),
        }
    }
    if let Some(category) = errors.take(category_field(&form)).flatten() {
        account.category = Some(category);
    }
    if let Some(salary) = errors.take(form.number("salary")).flatten() {
        account.salary = Some(salary);
    }
    if let Some(hire_date) = errors.take(date_field(&form, "hireDate")).flatten() {
        account.hire_date = Some(hire_date);
    }
    if let Some(tasks_completed) = errors.take(form.integer("tasksCompleted")).flatten() {
        account.tasks_completed = tasks_completed;
    }
    if let Some(rate) = errors.take(form.number("attendanceRate")).flatten() {
        account.attendance_rate = rate;
    }
    if let Some(score) = errors.take(form.number("performanceScore")).flatten() {
        account.performance_score = score;
    }
    let mut team_changed = false;
    if let Some(team) = form.list("team") {
        if let Some(team) = errors.take(id_list("team", team)) {
            account.team = team;
            team_changed = true;
        }
    }
    let password = password_field(&form, "password");
    if let Some(password) = &password {
        errors.take(Account::validate_plain_password(password));
    }

    errors.extend(account.validate());
    errors.finish()?;
    if team_changed {
        ensure_accounts_exist(&state, "team", &account.team).await?;
    }

    if let Some(password) = password {
        account.password = hash_password(&password, state.config.security.bcrypt_cost).await?;
    }
    if let Some(url) = store_upload(&state, &mut form, "profileImage", UploadKind::ProfileImage).await? {
        account.profile_picture = url;
    }

    let account = state.accounts().update(account).await?;
    info!("Updated employee {}", account.id());
    Ok(ApiResponse::success(public_view(&account)?))
}

/// DELETE /api/v1/employees/:id - Remove an account (Admin)
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    if id == ctx.account_id() {
        return Err(ApiError::bad_request("Admins cannot delete their own account"));
    }
    state.accounts().delete(&id).await?;
    info!("Account {} deleted employee {}", ctx.account_id(), id);

    // Managers must not keep a dangling member id
    let mut filter = Filter::new();
    filter.where_clause([FilterWhereInfo::eq("team", id.as_str())])?;
    for mut manager in state.accounts().select_any(&filter).await? {
        manager.team.retain(|member| member != &id);
        let manager = state.accounts().update(manager).await?;
        info!("Removed employee {} from the team of {}", id, manager.id());
    }

    Ok(ApiResponse::success(json!({})))
}
