// handlers/protected/announcements.rs - Company announcements

use axum::extract::{Path, RawQuery, State};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::handlers::utils::FieldErrors;
use crate::middleware::{ApiResponse, ApiResult, FormPayload, ListResponse, RequestContext};
use crate::models::Announcement;
use crate::services::{ListService, Populate, NAME_ONLY};
use crate::state::AppState;
use crate::store::{Document, Model};

const AUTHOR: Populate = Populate::accounts("author", NAME_ONLY);

/// GET /api/v1/announcements - Every announcement, newest first by default
pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<ListResponse<Document>, ApiError> {
    let service = ListService::new(state.store.clone(), &state.config.query);
    service.list::<Announcement>(query.as_deref(), vec![], Some(AUTHOR)).await
}

/// GET /api/v1/announcements/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Document> {
    let announcement = state.announcements().select_404(&id).await?;
    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::success(service.show(&announcement, Some(AUTHOR)).await?))
}

/// POST /api/v1/announcements - Publish an announcement (Admin)
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: FormPayload,
) -> ApiResult<Document> {
    let draft = Announcement {
        author: ctx.account_id().to_string(),
        title: form.text("title").unwrap_or_default(),
        content: form.text("content").unwrap_or_default(),
        ..Announcement::default()
    };
    let mut errors = FieldErrors::default();
    errors.extend(draft.validate());
    errors.finish()?;

    let announcement = state.announcements().create(draft).await?;
    info!("Account {} published announcement {}", ctx.account_id(), announcement.id());

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::created(service.show(&announcement, Some(AUTHOR)).await?))
}

/// PUT /api/v1/announcements/:id - Edit an announcement (Admin)
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    form: FormPayload,
) -> ApiResult<Document> {
    let mut announcement = state.announcements().select_404(&id).await?;

    if let Some(title) = form.text("title") {
        announcement.title = title;
    }
    if let Some(content) = form.text("content") {
        announcement.content = content;
    }

    let announcement = state.announcements().update(announcement).await?;
    info!("Account {} updated announcement {}", ctx.account_id(), announcement.id());

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::success(service.show(&announcement, Some(AUTHOR)).await?))
}

/// DELETE /api/v1/announcements/:id - Remove an announcement (Admin)
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let announcement = state.announcements().select_404(&id).await?;

    state.announcements().delete(announcement.id()).await?;
    info!("Account {} deleted announcement {}", ctx.account_id(), announcement.id());
    Ok(ApiResponse::success(json!({})))
}
