//! Webhook ingress.

use crate::api::AppState;
use crate::error::ApiError;
use crate::response::ApiResponse;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::json;

/// `POST /webhook/trigger/{token}` — resolve the webhook trigger by
/// exact token match and start a job with the request body bound as
/// the trigger node's output.
///
/// The body is parsed manually so malformed payloads come back in the
/// standard envelope; an empty body dispatches an empty object.
pub async fn ingress(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: String,
) -> Result<Json<ApiResponse>, ApiError> {
    let payload = parse_payload(&body)?;

    let job = state.engine.on_webhook(&token, payload).await?;
    state.engine.spawn_job(job.id);
    tracing::info!(job = %job.id, "webhook accepted");
    Ok(Json(ApiResponse::ok(json!({
        "job_id": job.id,
        "workflow_id": job.workflow_id,
    }))))
}

/// Parses a request body as a JSON payload; empty bodies become `{}`.
pub(crate) fn parse_payload(body: &str) -> Result<serde_json::Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(body).map_err(|e| ApiError::BadRequest {
        message: format!("invalid JSON payload: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_becomes_empty_object() {
        assert_eq!(parse_payload("").unwrap(), json!({}));
        assert_eq!(parse_payload("  \n").unwrap(), json!({}));
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = parse_payload("{not json").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }
}

