//! Handlers for the `/admin/content-hub` resource.
//!
//! Thin adapters over the plan and revert engines: each handler turns the
//! authenticated user into a `Caller`, builds the engine over the shared
//! stores and wraps the result in a `{ "data": ... }` envelope. Every
//! admin check happens inside the engines.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_assistant::{ChatMessage, PlanProposer, Proposal};
use folio_core::access::require_admin;
use folio_core::engine::{ExecutionReport, PlanEngine, DEFAULT_HISTORY_LIMIT};
use folio_core::plan::{ContentPlan, PlanDraft, PlanWithChanges};
use folio_core::revert::{ChangeRevert, PlanRevertReport, RevertEngine};
use folio_core::snapshot::{collect_snapshot, SiteSnapshot};
use folio_core::types::{ChangeId, PlanId};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The conversation so far, oldest first, ending with the admin's
    /// latest message.
    pub messages: Vec<ChatMessage>,
}

fn plan_engine(state: &AppState) -> PlanEngine<'_> {
    PlanEngine::new(&state.content, &state.plans, state.activity.as_ref())
}

fn revert_engine(state: &AppState) -> RevertEngine<'_> {
    RevertEngine::new(&state.content, &state.plans, state.activity.as_ref())
}

/// POST /api/v1/admin/content-hub/chat
///
/// Ask the assistant for a plan. Returns either a candidate plan (not yet
/// saved) or a plain reply.
pub async fn chat(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChatRequest>,
) -> AppResult<Json<DataResponse<Proposal>>> {
    let caller = auth.caller();
    require_admin(&caller)?;

    let snapshot = collect_snapshot(&state.content).await?;
    let proposal = PlanProposer::new(state.completion.as_ref())
        .propose(&caller, &input.messages, &snapshot)
        .await?;

    Ok(Json(DataResponse { data: proposal }))
}

/// GET /api/v1/admin/content-hub/snapshot
pub async fn snapshot(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SiteSnapshot>>> {
    require_admin(&auth.caller())?;
    let snapshot = collect_snapshot(&state.content).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/admin/content-hub/plans
///
/// Plan history, most recent first, each plan with its changes.
pub async fn list_plans(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<PlanWithChanges>>>> {
    let history = plan_engine(&state)
        .plan_history(
            &auth.caller(),
            params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            params.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(DataResponse { data: history }))
}

/// POST /api/v1/admin/content-hub/plans
///
/// Accept a candidate plan. The plan is stored as `proposed`; nothing is
/// executed.
pub async fn create_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(draft): Json<PlanDraft>,
) -> AppResult<(StatusCode, Json<DataResponse<ContentPlan>>)> {
    let plan = plan_engine(&state)
        .create_plan(&auth.caller(), draft)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: plan })))
}

/// GET /api/v1/admin/content-hub/plans/orphaned
///
/// Plans whose execution was interrupted after some changes were applied.
pub async fn orphaned_plans(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PlanWithChanges>>>> {
    let plans = plan_engine(&state).orphaned_plans(&auth.caller()).await?;
    Ok(Json(DataResponse { data: plans }))
}

/// GET /api/v1/admin/content-hub/plans/{id}
pub async fn get_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> AppResult<Json<DataResponse<PlanWithChanges>>> {
    let plan = plan_engine(&state)
        .plan_detail(&auth.caller(), plan_id)
        .await?;
    Ok(Json(DataResponse { data: plan }))
}

/// POST /api/v1/admin/content-hub/plans/{id}/execute
///
/// Returns 200 with the execution report even when some actions failed;
/// the report's `outcome` says whether the plan applied fully.
pub async fn execute_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> AppResult<Json<DataResponse<ExecutionReport>>> {
    let report = plan_engine(&state)
        .execute_plan(&auth.caller(), plan_id)
        .await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/admin/content-hub/plans/{id}/revert
pub async fn revert_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> AppResult<Json<DataResponse<PlanRevertReport>>> {
    let report = revert_engine(&state)
        .revert_plan(&auth.caller(), plan_id)
        .await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/admin/content-hub/changes/{id}/revert
///
/// Idempotent: reverting an already reverted change reports
/// `already_reverted` and touches nothing.
pub async fn revert_change(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(change_id): Path<ChangeId>,
) -> AppResult<Json<DataResponse<ChangeRevert>>> {
    let result = revert_engine(&state)
        .revert_change(&auth.caller(), change_id)
        .await?;
    Ok(Json(DataResponse { data: result }))
}
