//! Error types for the engine crate.
//!
//! - `LedgerError`: storage-level failures (not found, append conflicts)
//! - `DispatchError`: trigger resolution failures, surfaced to the
//!   caller and never retried — they represent caller/config error
//! - `ExecutionError`: failures of the execution machinery itself
//!   (a failed *step* is recorded on the job, not returned as an error)

use cogflow_core::JobId;
use cogflow_workflow::GraphError;
use cogflow_workflow::node::NodeId;
use std::fmt;

/// Errors from ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// An entity was not found.
    NotFound { entity: &'static str, id: String },
    /// A write violated the append-only/transition discipline.
    Conflict { reason: String },
}

impl LedgerError {
    /// Convenience constructor for not-found errors.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { reason } => write!(f, "ledger write conflict: {reason}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Errors from trigger dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No trigger matches the token/id.
    TriggerNotFound,
    /// The trigger exists but is disabled.
    TriggerDisabled { id: String },
    /// The owning workflow is not in an active state.
    WorkflowDisabled { id: String },
    /// Storage failure while resolving the trigger.
    Ledger(LedgerError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TriggerNotFound => write!(f, "trigger not found"),
            Self::TriggerDisabled { id } => write!(f, "trigger {id} is disabled"),
            Self::WorkflowDisabled { id } => write!(f, "workflow {id} is not active"),
            Self::Ledger(e) => write!(f, "dispatch storage error: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LedgerError> for DispatchError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

/// Errors from the execution machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Storage failure during execution.
    Ledger(LedgerError),
    /// The job's dag failed validation (should not happen for
    /// persisted dags; guards historical data).
    InvalidDag(GraphError),
    /// The dag references a node the job's steps do not cover.
    UnknownNode { node_id: NodeId },
    /// The job is not running (cancel of a pending/terminal job).
    JobNotRunning { id: JobId },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ledger(e) => write!(f, "execution storage error: {e}"),
            Self::InvalidDag(e) => write!(f, "invalid dag: {e}"),
            Self::UnknownNode { node_id } => write!(f, "unknown node: {node_id}"),
            Self::JobNotRunning { id } => write!(f, "job {id} is not running"),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ledger(e) => Some(e),
            Self::InvalidDag(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LedgerError> for ExecutionError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

impl From<GraphError> for ExecutionError {
    fn from(e: GraphError) -> Self {
        Self::InvalidDag(e)
    }
}
