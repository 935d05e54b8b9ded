//! Workflow definition types.
//!
//! A workflow is a named automation unit that owns one dag and its
//! triggers. The declarative script is the source of truth; the dag is
//! its compiled form. Counters are only ever mutated by the executor on
//! job transitions.

use crate::script::WorkflowScript;
use chrono::{DateTime, Utc};
use cogflow_core::{DagId, WorkflowId};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Lifecycle state of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Active; triggers may dispatch jobs.
    Enabled,
    /// Present but not dispatchable.
    Disabled,
    /// Being edited; not dispatchable.
    Draft,
}

/// Per-workflow job counters, maintained by the executor.
///
/// `running` tracks in-flight jobs; the terminal counters sum to the
/// number of terminal jobs for the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowCounters {
    /// Jobs currently running.
    pub running: u32,
    /// Jobs that ended succeeded.
    pub successful: u32,
    /// Jobs that ended canceled.
    pub canceled: u32,
    /// Jobs that ended failed.
    pub failed: u32,
}

impl WorkflowCounters {
    /// Total number of terminal jobs recorded.
    #[must_use]
    pub fn terminal_total(&self) -> u32 {
        self.successful + self.canceled + self.failed
    }
}

/// A workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier for this workflow.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Description of what this workflow does.
    pub description: Option<String>,
    /// Routing slug, generated at creation.
    pub flag: String,
    /// Lifecycle state.
    pub state: WorkflowState,
    /// Job counters.
    pub counters: WorkflowCounters,
    /// The currently active dag revision.
    pub dag_id: DagId,
    /// Script revision, bumped on every script/dag replacement.
    pub version: u32,
    /// The declarative source this workflow was compiled from.
    pub script: WorkflowScript,
    /// When this workflow was created.
    pub created_at: DateTime<Utc>,
    /// When this workflow was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates a new enabled workflow.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        script: WorkflowScript,
        dag_id: DagId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::new(),
            name: name.into(),
            description,
            flag: Ulid::new().to_string().to_lowercase(),
            state: WorkflowState::Enabled,
            counters: WorkflowCounters::default(),
            dag_id,
            version: 1,
            script,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns whether jobs may be dispatched for this workflow.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state == WorkflowState::Enabled
    }

    /// Enables the workflow.
    pub fn enable(&mut self) {
        self.state = WorkflowState::Enabled;
        self.touch();
    }

    /// Disables the workflow.
    pub fn disable(&mut self) {
        self.state = WorkflowState::Disabled;
        self.touch();
    }

    /// Installs a replacement dag revision, bumping the version.
    pub fn replace_dag(&mut self, dag_id: DagId) {
        self.dag_id = dag_id;
        self.version += 1;
        self.touch();
    }

    /// Bumps the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Summary information about a workflow (for listings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Workflow ID.
    pub id: WorkflowId,
    /// Workflow name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Lifecycle state.
    pub state: WorkflowState,
    /// Job counters.
    pub counters: WorkflowCounters,
    /// Script revision.
    pub version: u32,
    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id,
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            state: workflow.state,
            counters: workflow.counters,
            version: workflow.version,
            updated_at: workflow.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptLang;

    fn script() -> WorkflowScript {
        WorkflowScript::new(ScriptLang::Yaml, "name: test")
    }

    #[test]
    fn workflow_creation() {
        let workflow = Workflow::new("Test Workflow", None, script(), DagId::new());
        assert_eq!(workflow.name, "Test Workflow");
        assert!(workflow.is_enabled());
        assert_eq!(workflow.version, 1);
        assert!(!workflow.flag.is_empty());
    }

    #[test]
    fn workflow_enable_disable() {
        let mut workflow = Workflow::new("Test", None, script(), DagId::new());

        workflow.disable();
        assert!(!workflow.is_enabled());

        workflow.enable();
        assert!(workflow.is_enabled());
    }

    #[test]
    fn replace_dag_bumps_version() {
        let mut workflow = Workflow::new("Test", None, script(), DagId::new());
        let new_dag = DagId::new();

        workflow.replace_dag(new_dag);
        assert_eq!(workflow.dag_id, new_dag);
        assert_eq!(workflow.version, 2);
    }

    #[test]
    fn counters_terminal_total() {
        let counters = WorkflowCounters {
            running: 3,
            successful: 5,
            canceled: 1,
            failed: 2,
        };
        assert_eq!(counters.terminal_total(), 8);
    }

    #[test]
    fn workflow_summary_from_workflow() {
        let workflow = Workflow::new("Summary Test", Some("desc".to_string()), script(), DagId::new());
        let summary = WorkflowSummary::from(&workflow);

        assert_eq!(summary.id, workflow.id);
        assert_eq!(summary.name, "Summary Test");
        assert_eq!(summary.description.as_deref(), Some("desc"));
    }

    #[test]
    fn workflow_serde_roundtrip() {
        let workflow = Workflow::new("Serialization Test", None, script(), DagId::new());
        let json = serde_json::to_string(&workflow).expect("serialize");
        let parsed: Workflow = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(workflow, parsed);
    }
}
