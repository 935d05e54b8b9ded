//! Error types for the workflow crate.
//!
//! - `GraphError`: structural dag validation failures
//! - `ScriptError`: script parsing/compilation failures (wraps
//!   `GraphError` when the compiled graph is the problem)
//!
//! Both are rejected synchronously at create/update time; nothing that
//! fails these checks is ever persisted.

use crate::node::NodeId;
use std::fmt;

/// Errors from dag validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes share the same ID.
    DuplicateNodeId { node_id: NodeId },
    /// The dag has more than one trigger node.
    MultipleTriggers { count: usize },
    /// The dag has no trigger node.
    MissingTrigger,
    /// An edge references a node that does not exist.
    DanglingEdge { edge_id: String },
    /// The graph contains a cycle.
    CycleDetected,
    /// A node is not reachable from the trigger.
    Disconnected { node_id: NodeId },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id: {node_id}")
            }
            Self::MultipleTriggers { count } => {
                write!(f, "expected exactly one trigger node, found {count}")
            }
            Self::MissingTrigger => write!(f, "dag has no trigger node"),
            Self::DanglingEdge { edge_id } => {
                write!(f, "edge '{edge_id}' references a missing node")
            }
            Self::CycleDetected => write!(f, "graph contains a cycle"),
            Self::Disconnected { node_id } => {
                write!(f, "node {node_id} is not reachable from the trigger")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from script parsing and compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The document could not be parsed.
    Parse { message: String },
    /// The script has no name.
    MissingName,
    /// The script declares no triggers.
    NoTriggers,
    /// A trigger has an unknown type.
    UnknownTriggerType { value: String },
    /// A cron trigger is missing its `spec` rule.
    MissingCronSpec,
    /// A cron spec failed to parse.
    InvalidCronSpec { spec: String, reason: String },
    /// The script declares no pipeline.
    EmptyPipeline,
    /// A pipeline line is not a `source -> target` chain.
    InvalidPipeline { line: String },
    /// The script declares no tasks.
    NoTasks,
    /// A task action is not a well-formed `bot@rule_id` reference.
    InvalidAction { action: String },
    /// The compiled graph failed validation.
    Graph(GraphError),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { message } => write!(f, "failed to parse script: {message}"),
            Self::MissingName => write!(f, "script name is empty"),
            Self::NoTriggers => write!(f, "script declares no triggers"),
            Self::UnknownTriggerType { value } => {
                write!(f, "unknown trigger type: {value}")
            }
            Self::MissingCronSpec => write!(f, "cron trigger is missing its spec"),
            Self::InvalidCronSpec { spec, reason } => {
                write!(f, "invalid cron spec '{spec}': {reason}")
            }
            Self::EmptyPipeline => write!(f, "script declares no pipeline"),
            Self::InvalidPipeline { line } => {
                write!(f, "malformed pipeline line: {line}")
            }
            Self::NoTasks => write!(f, "script declares no tasks"),
            Self::InvalidAction { action } => {
                write!(f, "malformed task action: {action}")
            }
            Self::Graph(e) => write!(f, "compiled graph is invalid: {e}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for ScriptError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}
