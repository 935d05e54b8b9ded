//! Domain error types for the HTTP surface.
//!
//! Every error renders as the standard envelope with a banded retcode
//! and a user-safe message; internal detail stays in the logs.

use crate::response::{
    ApiResponse, RETCODE_BAD_PARAM, RETCODE_BAD_REQUEST, RETCODE_DISPATCH, RETCODE_EXECUTION,
    RETCODE_NOT_FOUND, RETCODE_STORAGE, RETCODE_VALIDATION,
};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cogflow_engine::{DispatchError, ExecutionError, LedgerError};
use cogflow_workflow::{GraphError, ScriptError};
use std::fmt;

/// Errors surfaced by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be understood.
    BadRequest { message: String },
    /// A path parameter did not parse.
    InvalidId { message: String },
    /// A referenced entity does not exist.
    NotFound { message: String },
    /// Script or graph validation failed.
    Validation { message: String },
    /// Trigger dispatch was rejected.
    Dispatch(DispatchError),
    /// The execution machinery rejected the request.
    Execution(ExecutionError),
    /// Storage conflict or failure.
    Storage(LedgerError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest { message } => write!(f, "bad request: {message}"),
            Self::InvalidId { message } => write!(f, "invalid id: {message}"),
            Self::NotFound { message } => write!(f, "{message}"),
            Self::Validation { message } => write!(f, "validation failed: {message}"),
            Self::Dispatch(e) => write!(f, "{e}"),
            Self::Execution(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl ApiError {
    fn status_and_retcode(&self) -> (StatusCode, i64) {
        match self {
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, RETCODE_BAD_REQUEST),
            Self::InvalidId { .. } => (StatusCode::BAD_REQUEST, RETCODE_BAD_PARAM),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, RETCODE_NOT_FOUND),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, RETCODE_VALIDATION),
            Self::Dispatch(e) => match e {
                DispatchError::TriggerNotFound => (StatusCode::NOT_FOUND, RETCODE_DISPATCH),
                DispatchError::TriggerDisabled { .. } | DispatchError::WorkflowDisabled { .. } => {
                    (StatusCode::CONFLICT, RETCODE_DISPATCH)
                }
                DispatchError::Ledger(_) => (StatusCode::INTERNAL_SERVER_ERROR, RETCODE_STORAGE),
            },
            Self::Execution(e) => match e {
                ExecutionError::JobNotRunning { .. } => (StatusCode::CONFLICT, RETCODE_EXECUTION),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, RETCODE_EXECUTION),
            },
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, RETCODE_STORAGE),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, retcode) = self.status_and_retcode();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::failed(retcode, self.to_string()))).into_response()
    }
}

impl From<ScriptError> for ApiError {
    fn from(e: ScriptError) -> Self {
        Self::Validation {
            message: e.to_string(),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        Self::Validation {
            message: e.to_string(),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

impl From<ExecutionError> for ApiError {
    fn from(e: ExecutionError) -> Self {
        match e {
            ExecutionError::Ledger(inner) => Self::from(inner),
            other => Self::Execution(other),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound { .. } => Self::NotFound {
                message: e.to_string(),
            },
            LedgerError::Conflict { .. } => Self::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_not_found_maps_to_not_found() {
        let err = ApiError::from(LedgerError::not_found("workflow", "wf_1"));
        assert!(matches!(err, ApiError::NotFound { .. }));
        let (status, retcode) = err.status_and_retcode();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(retcode, RETCODE_NOT_FOUND);
    }

    #[test]
    fn dispatch_disabled_maps_to_conflict() {
        let err = ApiError::from(DispatchError::TriggerDisabled {
            id: "trg_1".to_string(),
        });
        let (status, retcode) = err.status_and_retcode();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(retcode, RETCODE_DISPATCH);
    }

    #[test]
    fn script_error_maps_to_validation() {
        let err = ApiError::from(ScriptError::MissingName);
        let (status, retcode) = err.status_and_retcode();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(retcode, RETCODE_VALIDATION);
    }
}
