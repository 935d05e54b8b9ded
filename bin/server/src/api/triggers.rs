//! Trigger CRUD and manual execution handlers.

use crate::api::{AppState, parse_id};
use crate::error::ApiError;
use crate::response::ApiResponse;
use axum::Json;
use axum::extract::{Path, State};
use cogflow_core::{TriggerId, WorkflowId};
use cogflow_workflow::script::{TriggerSpec, validate_cron_spec};
use cogflow_workflow::WorkflowTrigger;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

/// Request body for trigger updates.
#[derive(Debug, Deserialize)]
pub struct UpdateTriggerRequest {
    pub enabled: Option<bool>,
}

/// `POST /workflow/workflow/{id}/trigger` — add a trigger to a
/// workflow. The body is a trigger spec (`{"type": "cron", "spec":
/// "0 7 * * *"}`); webhook triggers get a generated token.
pub async fn create_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let spec: TriggerSpec = serde_json::from_value(body).map_err(|e| ApiError::BadRequest {
        message: e.to_string(),
    })?;
    if let TriggerSpec::Cron { spec } = &spec {
        validate_cron_spec(spec)?;
    }

    let workflow = state.engine.ledger().workflow(id).await?;
    let trigger = WorkflowTrigger::new(workflow.id, spec.into_kind());
    state.engine.ledger().create_trigger(trigger.clone()).await?;
    tracing::info!(workflow = %id, trigger = %trigger.id, "trigger created");
    Ok(Json(ApiResponse::ok(trigger)))
}

/// `GET /workflow/workflow/{id}/triggers` — list a workflow's triggers.
pub async fn list_triggers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let _workflow = state.engine.ledger().workflow(id).await?;
    let triggers = state.engine.ledger().triggers_for(id).await?;
    Ok(Json(ApiResponse::ok(triggers)))
}

/// `GET /workflow/trigger/{id}` — fetch one trigger.
pub async fn get_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: TriggerId = parse_id(&id)?;
    let trigger = state.engine.ledger().trigger(id).await?;
    Ok(Json(ApiResponse::ok(trigger)))
}

/// `PUT /workflow/trigger/{id}` — enable/disable a trigger.
pub async fn update_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: TriggerId = parse_id(&id)?;
    let request: UpdateTriggerRequest =
        serde_json::from_value(body).map_err(|e| ApiError::BadRequest {
            message: e.to_string(),
        })?;

    let mut trigger = state.engine.ledger().trigger(id).await?;
    match request.enabled {
        Some(true) => trigger.enable(),
        Some(false) => trigger.disable(),
        None => {}
    }
    state.engine.ledger().update_trigger(trigger.clone()).await?;
    Ok(Json(ApiResponse::ok(trigger)))
}

/// `DELETE /workflow/trigger/{id}` — delete a trigger. Jobs it
/// dispatched are unaffected.
pub async fn delete_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: TriggerId = parse_id(&id)?;
    state.engine.ledger().delete_trigger(id).await?;
    tracing::info!(trigger = %id, "trigger deleted");
    Ok(Json(ApiResponse::ok(JsonValue::Null)))
}

/// `POST /workflow/trigger/{id}/run` — manual execution: enqueue and
/// start a job with the request body as trigger payload.
pub async fn run_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: TriggerId = parse_id(&id)?;
    let payload = crate::api::webhooks::parse_payload(&body)?;

    let job = state.engine.on_manual(id, payload).await?;
    state.engine.spawn_job(job.id);
    Ok(Json(ApiResponse::ok(json!({
        "job_id": job.id,
        "workflow_id": job.workflow_id,
    }))))
}
