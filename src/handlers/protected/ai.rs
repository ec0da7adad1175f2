// handlers/protected/ai.rs - AI helper endpoints backed by a CompletionClient

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream, Stream, StreamExt};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::ai::{parse_json_reply, prompts, AiError, CompletionOptions, TokenStream};
use crate::error::ApiError;
use crate::filter::{Filter, FilterWhereInfo};
use crate::middleware::{ApiResponse, ApiResult, FormPayload, RequestContext};
use crate::state::AppState;

/// POST /api/v1/ai/job-recommendations - Suggest roles for a profile
pub async fn job_recommendations(State(state): State<AppState>, form: FormPayload) -> ApiResult<Value> {
    let (Some(skills), Some(job_role), Some(resume)) = (form.text("skills"), form.text("jobRole"), form.text("resume"))
    else {
        return Err(ApiError::bad_request("Please provide skills, jobRole and resume"));
    };
    ensure_configured(&state)?;

    let options = analysis_options(&state).temperature(0.7).max_tokens(1024);
    let reply = state
        .ai
        .complete(&prompts::job_recommendations(&skills, &job_role, &resume), &options)
        .await?;
    Ok(ApiResponse::success(parse_json_reply(&reply)?))
}

/// POST /api/v1/ai/performance-suggestions - Advice for a team (Manager)
///
/// Without an AI credential a fixed baseline list is returned instead of 503.
pub async fn performance_suggestions(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: FormPayload,
) -> ApiResult<Value> {
    let team_data = form
        .value("teamData")
        .cloned()
        .ok_or_else(|| ApiError::bad_request("Please provide teamData"))?;

    if !state.ai.is_configured() {
        info!("Serving baseline suggestions to account {}", ctx.account_id());
        return Ok(ApiResponse::success(json!(prompts::BASELINE_SUGGESTIONS)));
    }

    let options = analysis_options(&state).temperature(0.5).max_tokens(1024);
    let reply = state
        .ai
        .complete(&prompts::performance_suggestions(&team_data), &options)
        .await?;
    match parse_json_reply(&reply)? {
        suggestions @ Value::Array(_) => Ok(ApiResponse::success(suggestions)),
        _ => Err(AiError::InvalidResponse(reply).into()),
    }
}

/// GET /api/v1/ai/best-employee - Pick the strongest performer (Admin)
pub async fn best_employee(State(state): State<AppState>) -> ApiResult<Value> {
    let mut filter = Filter::new();
    filter.where_clause([FilterWhereInfo::eq("role", "Employee")])?;
    let employees = state.accounts().select_any(&filter).await?;
    if employees.is_empty() {
        return Err(ApiError::not_found("No employees found"));
    }
    ensure_configured(&state)?;

    let employee_data: Vec<Value> = employees
        .iter()
        .map(|account| {
            json!({
                "name": account.full_name(),
                "department": account.department,
                "tasksCompleted": account.tasks_completed,
                "attendanceRate": account.attendance_rate,
                "performanceScore": account.performance_score,
                "hireDate": account.hire_date,
            })
        })
        .collect();

    let options = analysis_options(&state).temperature(0.3).max_tokens(512);
    let reply = state
        .ai
        .complete(&prompts::best_employee(&Value::Array(employee_data)), &options)
        .await?;
    Ok(ApiResponse::success(parse_json_reply(&reply)?))
}

/// POST /api/v1/ai/chat - Stream an assistant reply as Server-Sent Events (Admin)
///
/// Each token is sent as `{"content": ...}`; an upstream failure as
/// `{"error": ...}`; the stream always ends with `[DONE]`. A request the
/// upstream refuses outright is reported the same way once the stream opens.
pub async fn chat(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: FormPayload,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let message = form
        .text("message")
        .ok_or_else(|| ApiError::bad_request("Please provide a message"))?;
    ensure_configured(&state)?;

    let options = CompletionOptions::new(state.config.ai.chat_model.clone())
        .temperature(1.0)
        .max_tokens(8192);
    let tokens = match state.ai.stream(&prompts::admin_chat(&message), &options).await {
        Ok(tokens) => tokens,
        Err(e) => stream::once(async move { Err(e) }).boxed(),
    };
    info!("Streaming chat reply to account {}", ctx.account_id());

    Ok(Sse::new(chat_events(tokens)).keep_alive(KeepAlive::default()))
}

enum ChatPhase {
    Streaming(TokenStream),
    Closing,
}

fn chat_events(tokens: TokenStream) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(ChatPhase::Streaming(tokens)), |phase| async move {
        let (event, next) = match phase? {
            ChatPhase::Streaming(mut tokens) => match tokens.next().await {
                Some(Ok(token)) => (
                    Event::default().data(json!({ "content": token }).to_string()),
                    Some(ChatPhase::Streaming(tokens)),
                ),
                Some(Err(e)) => {
                    error!("Chat stream failed: {}", e);
                    (
                        Event::default().data(json!({ "error": "AI service request failed" }).to_string()),
                        Some(ChatPhase::Closing),
                    )
                }
                None => (done_event(), None),
            },
            ChatPhase::Closing => (done_event(), None),
        };
        Some((Ok::<_, Infallible>(event), next))
    })
}

fn done_event() -> Event {
    Event::default().data("[DONE]")
}

fn ensure_configured(state: &AppState) -> Result<(), ApiError> {
    if state.ai.is_configured() {
        Ok(())
    } else {
        Err(AiError::Unavailable.into())
    }
}

fn analysis_options(state: &AppState) -> CompletionOptions {
    CompletionOptions::new(state.config.ai.analysis_model.clone())
}
