//! Workflow model for the cogflow platform.
//!
//! This crate provides the domain types of the execution core:
//!
//! - **Graph Model**: dags of trigger/action nodes with validation and
//!   deterministic traversal
//! - **Scripts**: the declarative YAML dialect compiled into dags
//! - **Definitions**: workflows, counters and triggers
//! - **Jobs**: per-execution job/step state machines
//! - **Parameters**: `{{name}}` placeholder substitution

pub mod dag;
pub mod definition;
pub mod edge;
pub mod error;
pub mod job;
pub mod node;
pub mod params;
pub mod script;
pub mod trigger;

pub use dag::Dag;
pub use definition::{Workflow, WorkflowCounters, WorkflowState, WorkflowSummary};
pub use edge::Edge;
pub use error::{GraphError, ScriptError};
pub use job::{Job, JobState, Step, StepState};
pub use node::{Node, NodeId, NodeKind};
pub use script::{CompiledScript, ScriptLang, TriggerSpec, WorkflowScript};
pub use trigger::{TriggerKind, TriggerType, WorkflowTrigger};
