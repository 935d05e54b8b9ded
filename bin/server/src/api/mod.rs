//! HTTP surface of the workflow core.
//!
//! Routes mirror the admin client's REST layout: workflow CRUD and dag
//! management under `/workflow/workflow`, job inspection under
//! `/workflow/job`, trigger CRUD, the rule catalog, and webhook ingress
//! under `/webhook/trigger/{token}`.

pub mod actions;
pub mod jobs;
pub mod triggers;
pub mod webhooks;
pub mod workflows;

use crate::error::ApiError;
use axum::Router;
use axum::routing::{get, post};
use cogflow_engine::Engine;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The execution engine (and, through it, the ledger and rules).
    pub engine: Arc<Engine>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/workflow/workflow", post(workflows::create_workflow))
        .route("/workflow/workflows", get(workflows::list_workflows))
        .route(
            "/workflow/workflow/{id}",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route(
            "/workflow/workflow/{id}/dag",
            get(workflows::get_dag).put(workflows::replace_dag),
        )
        .route("/workflow/workflow/{id}/jobs", get(jobs::list_jobs))
        .route("/workflow/job/{id}", get(jobs::get_job))
        .route("/workflow/job/{id}/rerun", post(jobs::rerun_job))
        .route("/workflow/job/{id}/cancel", post(jobs::cancel_job))
        .route("/workflow/workflow/{id}/trigger", post(triggers::create_trigger))
        .route(
            "/workflow/workflow/{id}/triggers",
            get(triggers::list_triggers),
        )
        .route(
            "/workflow/trigger/{id}",
            get(triggers::get_trigger)
                .put(triggers::update_trigger)
                .delete(triggers::delete_trigger),
        )
        .route("/workflow/trigger/{id}/run", post(triggers::run_trigger))
        .route("/workflow/actions", get(actions::catalog))
        .route("/webhook/trigger/{token}", post(webhooks::ingress))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parses a path parameter into a typed id.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ApiError::InvalidId {
        message: e.to_string(),
    })
}
