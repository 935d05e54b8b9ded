//! The response envelope.
//!
//! Every handler answers `{status, retcode, message, data}`; `status`
//! is the caller-visible success signal, independent of the HTTP
//! status code. Retcodes are banded:
//!
//! - `0` — success
//! - `10xxx` — request errors (malformed body, bad parameter)
//! - `20xxx` — validation, dispatch and execution errors
//! - `31xxx` — storage errors

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Success retcode.
pub const RETCODE_OK: i64 = 0;
/// Malformed request body.
pub const RETCODE_BAD_REQUEST: i64 = 10001;
/// Missing or malformed parameter (e.g. an id that does not parse).
pub const RETCODE_BAD_PARAM: i64 = 10003;
/// Script or graph validation failed.
pub const RETCODE_VALIDATION: i64 = 20001;
/// Trigger dispatch was rejected.
pub const RETCODE_DISPATCH: i64 = 20002;
/// Execution machinery error (cancel of a non-running job, ...).
pub const RETCODE_EXECUTION: i64 = 20003;
/// Storage write conflict or failure.
pub const RETCODE_STORAGE: i64 = 31001;
/// Entity not found.
pub const RETCODE_NOT_FOUND: i64 = 31002;

/// Caller-visible success signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Failed,
}

/// The wire envelope for every response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    pub retcode: i64,
    pub message: String,
    pub data: JsonValue,
}

impl ApiResponse {
    /// Builds a success envelope around serializable data.
    #[must_use]
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            status: ResponseStatus::Ok,
            retcode: RETCODE_OK,
            message: String::new(),
            data: serde_json::to_value(data).unwrap_or(JsonValue::Null),
        }
    }

    /// Builds a failure envelope with a human-readable message.
    #[must_use]
    pub fn failed(retcode: i64, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            retcode,
            message: message.into(),
            data: JsonValue::Null,
        }
    }
}
