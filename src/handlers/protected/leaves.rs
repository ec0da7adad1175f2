// handlers/protected/leaves.rs - Leave requests and their approval

use axum::extract::{Path, RawQuery, State};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, FieldError};
use crate::filter::FilterWhereInfo;
use crate::handlers::utils::{date_field, validation_failed, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, FormPayload, ListResponse, RequestContext};
use crate::models::{Leave, LeaveStatus};
use crate::services::{ListService, Populate, NAME_ONLY};
use crate::state::AppState;
use crate::store::{Document, Model};

const REQUESTER: Populate = Populate::accounts("employee", NAME_ONLY);

/// GET /api/v1/leaves - Leave requests (Admin, Manager)
///
/// Managers only see requests from members of their team.
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(query): RawQuery,
) -> Result<ListResponse<Document>, ApiError> {
    let base = if ctx.is_admin() {
        vec![]
    } else {
        vec![FilterWhereInfo::any_of("employee", ctx.account.team.clone())]
    };

    let service = ListService::new(state.store.clone(), &state.config.query);
    service.list::<Leave>(query.as_deref(), base, Some(REQUESTER)).await
}

/// POST /api/v1/leaves - Request leave for the caller
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: FormPayload,
) -> ApiResult<Document> {
    let mut errors = FieldErrors::default();

    let draft = Leave {
        employee: ctx.account_id().to_string(),
        leave_type: form.text("leaveType").unwrap_or_default(),
        start_date: errors.take(date_field(&form, "startDate")).flatten().unwrap_or_default(),
        end_date: errors.take(date_field(&form, "endDate")).flatten().unwrap_or_default(),
        reason: form.text("reason"),
        ..Leave::default()
    };
    errors.extend(draft.validate());
    errors.finish()?;

    let leave = state.leaves().create(draft).await?;
    info!("Account {} requested leave {}", ctx.account_id(), leave.id());

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::created(service.show(&leave, Some(REQUESTER)).await?))
}

/// GET /api/v1/leaves/:id - Requester, Admin, or the requester's Manager
pub async fn get(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let leave = state.leaves().select_404(&id).await?;
    if leave.employee != ctx.account_id() && !can_decide(&ctx, &leave) {
        warn!("Account {} denied view of leave {}", ctx.account_id(), leave.id());
        return Err(ApiError::forbidden("Not authorized to view this leave request"));
    }

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::success(service.show(&leave, Some(REQUESTER)).await?))
}

/// PUT /api/v1/leaves/:id - Approve or reject a pending request (Admin, Manager)
///
/// Read, check, then write: two concurrent decisions on the same request
/// both pass the pending check and the later write wins.
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    form: FormPayload,
) -> ApiResult<Document> {
    let mut leave = state.leaves().select_404(&id).await?;
    if !can_decide(&ctx, &leave) {
        warn!("Account {} denied decision on leave {}", ctx.account_id(), leave.id());
        return Err(ApiError::forbidden("Not authorized to decide this leave request"));
    }

    let status = form
        .text("status")
        .and_then(|raw| LeaveStatus::parse_decision(&raw))
        .ok_or_else(|| {
            validation_failed(vec![FieldError::new("status", "Status must be Approved or Rejected")])
        })?;
    if leave.status != LeaveStatus::Pending {
        return Err(ApiError::bad_request(format!(
            "Leave request has already been {:?}",
            leave.status
        )));
    }

    leave.decide(status, ctx.account_id());
    let leave = state.leaves().update(leave).await?;
    info!("Account {} marked leave {} as {:?}", ctx.account_id(), leave.id(), leave.status);

    let service = ListService::new(state.store.clone(), &state.config.query);
    Ok(ApiResponse::success(service.show(&leave, Some(REQUESTER)).await?))
}

/// DELETE /api/v1/leaves/:id - Withdraw a pending request, or remove any as Admin
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let leave = state.leaves().select_404(&id).await?;
    if !ctx.is_admin() {
        if leave.employee != ctx.account_id() {
            warn!("Account {} denied delete of leave {}", ctx.account_id(), leave.id());
            return Err(ApiError::forbidden("Not authorized to delete this leave request"));
        }
        if leave.status != LeaveStatus::Pending {
            return Err(ApiError::bad_request("Only pending leave requests can be withdrawn"));
        }
    }

    state.leaves().delete(leave.id()).await?;
    info!("Account {} deleted leave {}", ctx.account_id(), leave.id());
    Ok(ApiResponse::success(json!({})))
}

/// Admins, or a Manager whose team contains the requester.
fn can_decide(ctx: &RequestContext, leave: &Leave) -> bool {
    ctx.is_admin() || (ctx.is_manager() && ctx.account.team.contains(&leave.employee))
}
