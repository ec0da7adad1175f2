// handlers/protected/tasks.rs - Task assignment and progress

use axum::extract::{Path, RawQuery, State};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, FieldError};
use crate::filter::FilterWhereInfo;
use crate::handlers::utils::{date_field, ensure_accounts_exist, store_upload, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, FormPayload, ListResponse, RequestContext};
use crate::models::{normalize_assignees, Task, TaskStatus};
use crate::services::{ListService, Populate, NAME_ONLY};
use crate::state::AppState;
use crate::storage::UploadKind;
use crate::store::{Document, Model};

const ASSIGNEES: Populate = Populate::accounts("assignedTo", NAME_ONLY);

/// Fields an assignee who did not create the task may send.
const ASSIGNEE_FIELDS: &[&str] = &["status", "submittedFile"];

/// GET /api/v1/tasks - Tasks visible to the caller
///
/// Admins see every task; Managers see tasks assigned to their team or to
/// themselves; everyone else sees tasks assigned to them.
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(query): RawQuery,
) -> Result<ListResponse<Document>, ApiError> {
    let base = if ctx.is_admin() {
        vec![]
    } else if ctx.is_manager() {
        let mut visible = ctx.account.team.clone();
        visible.push(ctx.account_id().to_string());
        vec![FilterWhereInfo::any_of("assignedTo", visible)]
    } else {
        vec![FilterWhereInfo::eq("assignedTo", ctx.account_id())]
    };

    let service = ListService::new(state.store.clone(), &state.config.query);
    service.list::<Task>(query.as_deref(), base, Some(ASSIGNEES)).await
}

/// POST /api/v1/tasks - Assign a task (Manager)
///
/// `assignedTo` may be one id, a JSON-array string or an array. `dueDate`
/// is accepted in place of `deadline`.
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: FormPayload,
) -> ApiResult<Document> {
    let mut errors = FieldErrors::default();

    let assigned_to = errors
        .take(normalize_assignees(form.value("assignedTo").unwrap_or(&Value::Null)))
        .unwrap_or_default();
    let deadline = errors.take(deadline_field(&form)).flatten().unwrap_or_default();
    let status = errors.take(status_field(&form)).flatten().unwrap_or_default();

    let draft = Task {
        title: form.text("title").unwrap_or_default(),
        description: form.text("description").unwrap_or_default(),
        assigned_to,
        assigned_by: ctx.account_id().to_string(),
        deadline,
        status,
        ..Task::default()
    };
    errors.extend(draft.validate());
    errors.finish()?;
    ensure_accounts_exist(&state, "assignedTo", &draft.assigned_to).await?;

    let task = state.tasks().create(draft).await?;
    info!(
        "Account {} assigned task {} to {} account(s)",
        ctx.account_id(),
        task.id(),
        task.assigned_to.len()
    );

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::created(service.show(&task, Some(ASSIGNEES)).await?))
}

/// GET /api/v1/tasks/:id - One task, if the caller may see it
pub async fn get(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let task = state.tasks().select_404(&id).await?;
    if !can_view(&ctx, &task) {
        warn!("Account {} denied view of task {}", ctx.account_id(), task.id());
        return Err(ApiError::forbidden("Not authorized to view this task"));
    }

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::success(service.show(&task, Some(ASSIGNEES)).await?))
}

/// PUT /api/v1/tasks/:id - Edit a task or report progress on it
///
/// The assigner and Admins may change anything except `assignedBy`.
/// Assignees may change only `status` and `submittedFile`, which may be
/// sent as a multipart file.
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    mut form: FormPayload,
) -> ApiResult<Document> {
    let mut task = state.tasks().select_404(&id).await?;
    let owner = is_owner(&ctx, &task);

    if !owner && !task.is_assignee(ctx.account_id()) {
        warn!("Account {} denied update of task {}", ctx.account_id(), task.id());
        return Err(ApiError::forbidden("Not authorized to update this task"));
    }
    if !owner {
        if let Some(field) = form.keys().find(|key| !ASSIGNEE_FIELDS.contains(key)) {
            return Err(ApiError::forbidden(format!(
                "Assignees may only update status and submittedFile, not {}",
                field
            )));
        }
    }
    if form.text("assignedBy").is_some_and(|by| by != task.assigned_by) {
        return Err(ApiError::bad_request("assignedBy cannot be changed"));
    }

    let mut errors = FieldErrors::default();
    let mut reassigned = false;
    if owner {
        if let Some(title) = form.text("title") {
            task.title = title;
        }
        if let Some(description) = form.text("description") {
            task.description = description;
        }
        if let Some(deadline) = errors.take(deadline_field(&form)).flatten() {
            task.deadline = deadline;
        }
        if let Some(raw) = form.value("assignedTo") {
            if let Some(assigned_to) = errors.take(normalize_assignees(raw)) {
                task.assigned_to = assigned_to;
                reassigned = true;
            }
        }
    }
    if let Some(status) = errors.take(status_field(&form)).flatten() {
        task.status = status;
    }
    if let Some(url) = form.text("submittedFile") {
        task.submitted_file = Some(url);
    }

    errors.extend(task.validate());
    errors.finish()?;
    if reassigned {
        ensure_accounts_exist(&state, "assignedTo", &task.assigned_to).await?;
    }

    if let Some(url) = store_upload(&state, &mut form, "submittedFile", UploadKind::Submission).await? {
        task.submitted_file = Some(url);
    }

    let task = state.tasks().update(task).await?;
    info!("Account {} updated task {} ({:?})", ctx.account_id(), task.id(), task.status);

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::success(service.show(&task, Some(ASSIGNEES)).await?))
}

/// DELETE /api/v1/tasks/:id - Remove a task (assigner or Admin)
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let task = state.tasks().select_404(&id).await?;
    if !is_owner(&ctx, &task) {
        warn!("Account {} denied delete of task {}", ctx.account_id(), task.id());
        return Err(ApiError::forbidden("Not authorized to delete this task"));
    }

    state.tasks().delete(task.id()).await?;
    info!("Account {} deleted task {}", ctx.account_id(), task.id());
    Ok(ApiResponse::success(json!({})))
}

fn is_owner(ctx: &RequestContext, task: &Task) -> bool {
    ctx.is_admin() || task.assigned_by == ctx.account_id()
}

fn can_view(ctx: &RequestContext, task: &Task) -> bool {
    is_owner(ctx, task)
        || task.is_assignee(ctx.account_id())
        || (ctx.is_manager() && task.assigned_to.iter().any(|id| ctx.account.team.contains(id)))
}

fn deadline_field(form: &FormPayload) -> Result<Option<String>, FieldError> {
    if form.has("deadline") {
        date_field(form, "deadline")
    } else {
        date_field(form, "dueDate").map_err(|_| FieldError::new("deadline", "deadline must be a valid date"))
    }
}

fn status_field(form: &FormPayload) -> Result<Option<TaskStatus>, FieldError> {
    match form.text("status") {
        Some(raw) => TaskStatus::parse(&raw).map(Some).ok_or_else(|| {
            FieldError::new("status", "Status must be Pending, In Progress, Completed or Reviewed")
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Category};
    use crate::store::Meta;

    fn ctx(id: &str, category: Category, team: &[&str]) -> RequestContext {
        RequestContext {
            account: Account {
                meta: Meta { id: id.to_string(), ..Meta::default() },
                category: Some(category),
                team: team.iter().map(|s| s.to_string()).collect(),
                ..Account::default()
            },
        }
    }

    fn task() -> Task {
        Task {
            assigned_to: vec!["e1".to_string()],
            assigned_by: "m1".to_string(),
            ..Task::default()
        }
    }

    #[test]
    fn visibility_follows_assignment_and_team() {
        assert!(can_view(&ctx("m1", Category::Manager, &[]), &task()));
        assert!(can_view(&ctx("e1", Category::Staff, &[]), &task()));
        assert!(can_view(&ctx("m2", Category::Manager, &["e1"]), &task()));
        assert!(!can_view(&ctx("m3", Category::Manager, &["e9"]), &task()));
        assert!(!can_view(&ctx("e2", Category::Staff, &["e1"]), &task()));
    }

    #[test]
    fn only_the_assigner_owns_the_task() {
        assert!(is_owner(&ctx("m1", Category::Manager, &[]), &task()));
        assert!(!is_owner(&ctx("e1", Category::Staff, &[]), &task()));
    }

    #[test]
    fn due_date_stands_in_for_deadline() {
        let form = FormPayload::from_fields(json!({ "dueDate": "2024-09-01" }).as_object().cloned().unwrap());
        assert_eq!(deadline_field(&form).unwrap().as_deref(), Some("2024-09-01T00:00:00.000Z"));

        let form = FormPayload::from_fields(json!({ "dueDate": "later" }).as_object().cloned().unwrap());
        assert_eq!(deadline_field(&form).unwrap_err().field, "deadline");
    }
}
