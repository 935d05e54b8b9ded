//! The job/step ledger.
//!
//! The ledger is the system of record for workflows, dags, triggers,
//! jobs and steps. Implementations must guarantee:
//!
//! - steps are append-only: one write into `running`, one terminal
//!   write, never a rewrite of a terminal step
//! - workflow counters change atomically with the job transition that
//!   causes them, under a single writer per workflow
//! - dag revisions referenced by historical jobs stay resolvable after
//!   a workflow's dag is replaced

use crate::error::LedgerError;
use async_trait::async_trait;
use cogflow_core::{DagId, JobId, TriggerId, WorkflowId};
use cogflow_workflow::node::NodeId;
use cogflow_workflow::{Dag, Job, JobState, Step, Workflow, WorkflowTrigger};
use serde_json::Value as JsonValue;

/// Terminal outcome of a step, written exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The rule returned output.
    Succeeded(JsonValue),
    /// The rule failed or timed out; carries human-readable detail.
    Failed(String),
    /// The step was not executed. An output that arrived after
    /// cancellation may still be recorded.
    Skipped(Option<JsonValue>),
}

/// Storage seam for the execution core.
#[async_trait]
pub trait Ledger: Send + Sync {
    // --- Workflows ---

    /// Persists a new workflow with its dag and triggers.
    async fn create_workflow(
        &self,
        workflow: Workflow,
        dag: Dag,
        triggers: Vec<WorkflowTrigger>,
    ) -> Result<(), LedgerError>;

    /// Fetches a workflow by id.
    async fn workflow(&self, id: WorkflowId) -> Result<Workflow, LedgerError>;

    /// Lists all workflows.
    async fn workflows(&self) -> Result<Vec<Workflow>, LedgerError>;

    /// Updates workflow metadata/state (not counters).
    async fn update_workflow(&self, workflow: Workflow) -> Result<(), LedgerError>;

    /// Deletes a workflow, cascading its dags, triggers and jobs.
    async fn delete_workflow(&self, id: WorkflowId) -> Result<(), LedgerError>;

    /// Installs a new dag revision for a workflow, bumping its version.
    /// Previous revisions stay resolvable for historical jobs.
    async fn replace_dag(&self, workflow_id: WorkflowId, dag: Dag) -> Result<Workflow, LedgerError>;

    /// Fetches a dag revision by id.
    async fn dag(&self, id: DagId) -> Result<Dag, LedgerError>;

    // --- Triggers ---

    /// Persists a new trigger.
    async fn create_trigger(&self, trigger: WorkflowTrigger) -> Result<(), LedgerError>;

    /// Fetches a trigger by id.
    async fn trigger(&self, id: TriggerId) -> Result<WorkflowTrigger, LedgerError>;

    /// Lists a workflow's triggers in creation order.
    async fn triggers_for(&self, workflow_id: WorkflowId) -> Result<Vec<WorkflowTrigger>, LedgerError>;

    /// Updates a trigger.
    async fn update_trigger(&self, trigger: WorkflowTrigger) -> Result<(), LedgerError>;

    /// Deletes a trigger.
    async fn delete_trigger(&self, id: TriggerId) -> Result<(), LedgerError>;

    /// Finds the webhook trigger with an exactly matching token.
    async fn find_webhook_trigger(&self, token: &str)
    -> Result<Option<WorkflowTrigger>, LedgerError>;

    /// Lists enabled cron triggers belonging to active workflows.
    async fn cron_triggers(&self) -> Result<Vec<WorkflowTrigger>, LedgerError>;

    // --- Jobs and steps ---

    /// Persists a new pending job.
    async fn create_job(&self, job: Job) -> Result<(), LedgerError>;

    /// Fetches a job (with steps) by id.
    async fn job(&self, id: JobId) -> Result<Job, LedgerError>;

    /// Lists a workflow's jobs, newest first.
    async fn jobs_for(&self, workflow_id: WorkflowId) -> Result<Vec<Job>, LedgerError>;

    /// Transitions a pending job to running, installing its step
    /// records and incrementing the workflow's running counter in the
    /// same critical section.
    async fn job_started(&self, id: JobId, steps: Vec<Step>) -> Result<(), LedgerError>;

    /// Transitions a running job to a terminal state, adjusting the
    /// workflow counters atomically with the transition.
    async fn job_finished(&self, id: JobId, state: JobState) -> Result<(), LedgerError>;

    /// Writes a step's `running` record with its bound input.
    async fn step_started(
        &self,
        job_id: JobId,
        node_id: &NodeId,
        input: JsonValue,
    ) -> Result<(), LedgerError>;

    /// Writes a step's terminal record. Rejects terminal rewrites.
    async fn step_finished(
        &self,
        job_id: JobId,
        node_id: &NodeId,
        outcome: StepOutcome,
    ) -> Result<(), LedgerError>;
}
