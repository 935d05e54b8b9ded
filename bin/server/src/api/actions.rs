//! Rule catalog handler.

use crate::api::AppState;
use crate::error::ApiError;
use crate::response::ApiResponse;
use axum::Json;
use axum::extract::State;

/// `GET /workflow/actions` — the rule catalog, used by the front end
/// to render node configuration forms.
pub async fn catalog(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    let rules = state.engine.rules().catalog();
    Ok(Json(ApiResponse::ok(rules)))
}
