//! Job and step records: the execution state machines.
//!
//! One job is created per trigger firing; one step per node visited.
//! Job states: `pending -> running -> {succeeded, failed, canceled}`.
//! Step states: `pending -> running -> {succeeded, failed, skipped}`.
//! Terminal states accept no further transitions; the ledger enforces
//! that terminal steps are never rewritten.

use crate::node::NodeId;
use chrono::{DateTime, Utc};
use cogflow_core::{DagId, JobId, StepId, TriggerId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The overall state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created by the dispatcher, waiting for the executor.
    Pending,
    /// Actively executing.
    Running,
    /// All reachable nodes resolved without failure.
    Succeeded,
    /// At least one step failed fatally.
    Failed,
    /// Canceled by an admin/manual request.
    Canceled,
}

impl JobState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// The state of a single step within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Waiting for predecessors to resolve.
    Pending,
    /// Rule invocation in flight.
    Running,
    /// Rule invocation returned output.
    Succeeded,
    /// Rule invocation failed or timed out.
    Failed,
    /// Not executed: every predecessor resolved non-succeeded, or the
    /// job was canceled while this step was in flight.
    Skipped,
}

impl StepState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// One execution record of a node within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier for this step.
    pub id: StepId,
    /// The job this step belongs to.
    pub job_id: JobId,
    /// The node being executed.
    pub node_id: NodeId,
    /// Current state.
    pub state: StepState,
    /// The parameters actually bound for the invocation.
    pub input: Option<JsonValue>,
    /// Output produced by the rule.
    pub output: Option<JsonValue>,
    /// Error detail if failed.
    pub error: Option<String>,
    /// When the invocation started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the step reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
}

impl Step {
    /// Creates a new pending step.
    #[must_use]
    pub fn new(job_id: JobId, node_id: NodeId) -> Self {
        Self {
            id: StepId::new(),
            job_id,
            node_id,
            state: StepState::Pending,
            input: None,
            output: None,
            error: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Starts the step with its bound input.
    pub fn start(&mut self, input: JsonValue) {
        self.state = StepState::Running;
        self.started_at = Some(Utc::now());
        self.input = Some(input);
    }

    /// Marks the step succeeded with its output.
    pub fn succeed(&mut self, output: JsonValue) {
        self.state = StepState::Succeeded;
        self.ended_at = Some(Utc::now());
        self.output = Some(output);
    }

    /// Marks the step failed with error detail.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = StepState::Failed;
        self.ended_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Marks the step skipped. An output that arrived for a canceled
    /// job may still be recorded, but is not actioned further.
    pub fn skip(&mut self, output: Option<JsonValue>) {
        self.state = StepState::Skipped;
        self.ended_at = Some(Utc::now());
        if output.is_some() {
            self.output = output;
        }
    }
}

/// One execution attempt of a workflow's dag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier for this job.
    pub id: JobId,
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// The dag revision active when the trigger fired.
    pub dag_id: DagId,
    /// The trigger that initiated this job.
    pub trigger_id: TriggerId,
    /// The script revision active when the trigger fired.
    pub script_version: u32,
    /// Current state.
    pub state: JobState,
    /// The dispatch payload bound to the trigger node.
    pub trigger_payload: JsonValue,
    /// Steps in deterministic traversal order.
    pub steps: Vec<Step>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Creates a new pending job.
    #[must_use]
    pub fn new(
        workflow_id: WorkflowId,
        dag_id: DagId,
        trigger_id: TriggerId,
        script_version: u32,
        trigger_payload: JsonValue,
    ) -> Self {
        Self {
            id: JobId::new(),
            workflow_id,
            dag_id,
            trigger_id,
            script_version,
            state: JobState::Pending,
            trigger_payload,
            steps: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Starts the job.
    pub fn start(&mut self) {
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Finishes the job in the given terminal state.
    pub fn finish(&mut self, state: JobState) {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.ended_at = Some(Utc::now());
    }

    /// Returns the step for a node, if present.
    #[must_use]
    pub fn step(&self, node_id: &NodeId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.node_id == node_id)
    }

    /// Returns a mutable reference to the step for a node.
    pub fn step_mut(&mut self, node_id: &NodeId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| &s.node_id == node_id)
    }

    /// Returns the duration of the job, if it has started.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        let end = self.ended_at.unwrap_or_else(Utc::now);
        Some(end - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> Job {
        Job::new(
            WorkflowId::new(),
            DagId::new(),
            TriggerId::new(),
            1,
            serde_json::json!({"event": "test"}),
        )
    }

    #[test]
    fn job_state_terminal() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Canceled.is_terminal());
    }

    #[test]
    fn step_state_terminal() {
        assert!(!StepState::Pending.is_terminal());
        assert!(!StepState::Running.is_terminal());
        assert!(StepState::Succeeded.is_terminal());
        assert!(StepState::Failed.is_terminal());
        assert!(StepState::Skipped.is_terminal());
    }

    #[test]
    fn job_lifecycle() {
        let mut job = new_job();
        assert_eq!(job.state, JobState::Pending);
        assert!(job.started_at.is_none());

        job.start();
        assert_eq!(job.state, JobState::Running);
        assert!(job.started_at.is_some());

        job.finish(JobState::Succeeded);
        assert_eq!(job.state, JobState::Succeeded);
        assert!(job.ended_at.is_some());
        assert!(job.duration().is_some());
    }

    #[test]
    fn step_lifecycle() {
        let mut step = Step::new(JobId::new(), NodeId::new("actionA"));
        assert_eq!(step.state, StepState::Pending);

        step.start(serde_json::json!({"x": 1}));
        assert_eq!(step.state, StepState::Running);
        assert!(step.started_at.is_some());

        step.succeed(serde_json::json!({"y": 2}));
        assert_eq!(step.state, StepState::Succeeded);
        assert_eq!(step.output, Some(serde_json::json!({"y": 2})));
    }

    #[test]
    fn step_failure_records_error() {
        let mut step = Step::new(JobId::new(), NodeId::new("actionA"));
        step.start(serde_json::json!({}));
        step.fail("rule invocation timed out");

        assert_eq!(step.state, StepState::Failed);
        assert_eq!(step.error.as_deref(), Some("rule invocation timed out"));
        assert!(step.ended_at.is_some());
    }

    #[test]
    fn skipped_step_may_record_late_output() {
        let mut step = Step::new(JobId::new(), NodeId::new("actionA"));
        step.start(serde_json::json!({}));
        step.skip(Some(serde_json::json!({"late": true})));

        assert_eq!(step.state, StepState::Skipped);
        assert_eq!(step.output, Some(serde_json::json!({"late": true})));
    }

    #[test]
    fn job_step_lookup_by_node() {
        let mut job = new_job();
        job.steps.push(Step::new(job.id, NodeId::new("a")));
        job.steps.push(Step::new(job.id, NodeId::new("b")));

        assert!(job.step(&NodeId::new("a")).is_some());
        assert!(job.step(&NodeId::new("missing")).is_none());
    }

    #[test]
    fn job_serde_roundtrip() {
        let mut job = new_job();
        job.steps.push(Step::new(job.id, NodeId::new("a")));

        let json = serde_json::to_string(&job).expect("serialize");
        let parsed: Job = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(job, parsed);
    }
}
