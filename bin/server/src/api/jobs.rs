//! Job inspection, rerun and cancel handlers.

use crate::api::{AppState, parse_id};
use crate::error::ApiError;
use crate::response::ApiResponse;
use axum::Json;
use axum::extract::{Path, State};
use cogflow_core::{JobId, WorkflowId};
use serde_json::{Value as JsonValue, json};

/// `GET /workflow/workflow/{id}/jobs` — list a workflow's jobs,
/// newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    // Distinguish an unknown workflow from one with no jobs yet.
    let _workflow = state.engine.ledger().workflow(id).await?;
    let jobs = state.engine.ledger().jobs_for(id).await?;
    Ok(Json(ApiResponse::ok(jobs)))
}

/// `GET /workflow/job/{id}` — fetch one job with its steps.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: JobId = parse_id(&id)?;
    let job = state.engine.ledger().job(id).await?;
    Ok(Json(ApiResponse::ok(job)))
}

/// `POST /workflow/job/{id}/rerun` — create and start a new job
/// re-executing the original's dag revision with its trigger payload.
pub async fn rerun_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: JobId = parse_id(&id)?;
    let job = state.engine.rerun(id).await?;
    state.engine.spawn_job(job.id);
    Ok(Json(ApiResponse::ok(json!({
        "job_id": job.id,
        "workflow_id": job.workflow_id,
    }))))
}

/// `POST /workflow/job/{id}/cancel` — request cooperative cancellation
/// of a running job.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: JobId = parse_id(&id)?;
    state.engine.cancel(id).await?;
    Ok(Json(ApiResponse::ok(JsonValue::Null)))
}
