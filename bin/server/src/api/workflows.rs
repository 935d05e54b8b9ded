//! Workflow CRUD and dag management handlers.

use crate::api::{AppState, parse_id};
use crate::error::ApiError;
use crate::response::ApiResponse;
use axum::Json;
use axum::extract::{Path, State};
use cogflow_core::WorkflowId;
use cogflow_workflow::{
    Dag, Edge, Node, Workflow, WorkflowScript, WorkflowState, WorkflowSummary, WorkflowTrigger,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Request body for create/update: the declarative script, plus an
/// optional lifecycle state change on update.
#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    pub script: WorkflowScript,
    #[serde(default)]
    pub state: Option<WorkflowState>,
}

/// Request body for dag replacement.
#[derive(Debug, Deserialize)]
pub struct DagRequest {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A workflow together with its triggers, as returned to clients.
#[derive(Debug, Serialize)]
pub struct WorkflowDetail {
    pub workflow: Workflow,
    pub triggers: Vec<WorkflowTrigger>,
}

fn decode<T: serde::de::DeserializeOwned>(body: JsonValue) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest {
        message: e.to_string(),
    })
}

/// `POST /workflow/workflow` — create a workflow from a script.
pub async fn create_workflow(
    State(state): State<AppState>,
    Json(body): Json<JsonValue>,
) -> Result<Json<ApiResponse>, ApiError> {
    let request: WorkflowRequest = decode(body)?;
    let compiled = request.script.compile()?;

    let workflow = Workflow::new(
        compiled.name,
        compiled.description,
        request.script,
        compiled.dag.id,
    );
    let triggers: Vec<WorkflowTrigger> = compiled
        .triggers
        .into_iter()
        .map(|spec| WorkflowTrigger::new(workflow.id, spec.into_kind()))
        .collect();

    state
        .engine
        .ledger()
        .create_workflow(workflow.clone(), compiled.dag, triggers.clone())
        .await?;
    tracing::info!(workflow = %workflow.id, name = %workflow.name, "workflow created");

    Ok(Json(ApiResponse::ok(WorkflowDetail { workflow, triggers })))
}

/// `GET /workflow/workflows` — list workflow summaries.
pub async fn list_workflows(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse>, ApiError> {
    let workflows = state.engine.ledger().workflows().await?;
    let summaries: Vec<WorkflowSummary> = workflows.iter().map(WorkflowSummary::from).collect();
    Ok(Json(ApiResponse::ok(summaries)))
}

/// `GET /workflow/workflow/{id}` — fetch one workflow with triggers.
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let workflow = state.engine.ledger().workflow(id).await?;
    let triggers = state.engine.ledger().triggers_for(id).await?;
    Ok(Json(ApiResponse::ok(WorkflowDetail { workflow, triggers })))
}

/// `PUT /workflow/workflow/{id}` — re-compile the script and install
/// the new dag revision. Existing triggers are managed through their
/// own endpoints and stay untouched.
pub async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let request: WorkflowRequest = decode(body)?;
    let compiled = request.script.compile()?;

    let mut workflow = state.engine.ledger().workflow(id).await?;
    workflow.name = compiled.name;
    workflow.description = compiled.description;
    workflow.script = request.script;
    if let Some(next_state) = request.state {
        workflow.state = next_state;
    }
    workflow.touch();
    state.engine.ledger().update_workflow(workflow).await?;

    let updated = state.engine.ledger().replace_dag(id, compiled.dag).await?;
    tracing::info!(workflow = %id, version = updated.version, "workflow updated");
    Ok(Json(ApiResponse::ok(updated)))
}

/// `DELETE /workflow/workflow/{id}` — delete, cascading dags, triggers
/// and jobs.
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    state.engine.ledger().delete_workflow(id).await?;
    tracing::info!(workflow = %id, "workflow deleted");
    Ok(Json(ApiResponse::ok(JsonValue::Null)))
}

/// `GET /workflow/workflow/{id}/dag` — fetch the active dag revision.
pub async fn get_dag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let workflow = state.engine.ledger().workflow(id).await?;
    let dag = state.engine.ledger().dag(workflow.dag_id).await?;
    Ok(Json(ApiResponse::ok(dag)))
}

/// `PUT /workflow/workflow/{id}/dag` — validate and install a
/// replacement dag.
pub async fn replace_dag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<Json<ApiResponse>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let request: DagRequest = decode(body)?;

    let dag = Dag::from_parts(request.nodes, request.edges);
    dag.validate()?;

    // Reject replacements for unknown workflows before writing.
    let _workflow = state.engine.ledger().workflow(id).await?;
    let updated = state.engine.ledger().replace_dag(id, dag).await?;
    tracing::info!(workflow = %id, version = updated.version, "dag replaced");
    Ok(Json(ApiResponse::ok(updated)))
}
