//! In-memory ledger implementation.
//!
//! A single `RwLock` over the whole store linearizes counter updates:
//! every job transition and its counter adjustment happen inside one
//! write-lock critical section, so concurrent jobs of the same
//! workflow can never lose updates. Durable implementations would
//! replace this seam.

use crate::error::LedgerError;
use crate::ledger::{Ledger, StepOutcome};
use async_trait::async_trait;
use cogflow_core::{DagId, JobId, TriggerId, WorkflowId};
use cogflow_workflow::node::NodeId;
use cogflow_workflow::{
    Dag, Job, JobState, Step, StepState, TriggerType, Workflow, WorkflowTrigger,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    workflows: HashMap<WorkflowId, Workflow>,
    dags: HashMap<DagId, Dag>,
    dag_owners: HashMap<DagId, WorkflowId>,
    triggers: HashMap<TriggerId, WorkflowTrigger>,
    jobs: HashMap<JobId, Job>,
}

/// In-memory [`Ledger`].
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_workflow(
        &self,
        workflow: Workflow,
        dag: Dag,
        triggers: Vec<WorkflowTrigger>,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        inner.dag_owners.insert(dag.id, workflow.id);
        inner.dags.insert(dag.id, dag);
        for trigger in triggers {
            inner.triggers.insert(trigger.id, trigger);
        }
        inner.workflows.insert(workflow.id, workflow);
        Ok(())
    }

    async fn workflow(&self, id: WorkflowId) -> Result<Workflow, LedgerError> {
        self.inner
            .read()
            .await
            .workflows
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("workflow", id))
    }

    async fn workflows(&self) -> Result<Vec<Workflow>, LedgerError> {
        let inner = self.inner.read().await;
        let mut workflows: Vec<Workflow> = inner.workflows.values().cloned().collect();
        workflows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.as_ulid().cmp(&b.id.as_ulid())));
        Ok(workflows)
    }

    async fn update_workflow(&self, workflow: Workflow) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .workflows
            .get_mut(&workflow.id)
            .ok_or_else(|| LedgerError::not_found("workflow", workflow.id))?;
        // Counters belong to the executor; metadata updates must not
        // clobber transitions that happened since the caller's read.
        let counters = entry.counters;
        *entry = workflow;
        entry.counters = counters;
        Ok(())
    }

    async fn delete_workflow(&self, id: WorkflowId) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        inner
            .workflows
            .remove(&id)
            .ok_or_else(|| LedgerError::not_found("workflow", id))?;
        inner.triggers.retain(|_, t| t.workflow_id != id);
        inner.jobs.retain(|_, j| j.workflow_id != id);
        let owned: Vec<DagId> = inner
            .dag_owners
            .iter()
            .filter(|(_, owner)| **owner == id)
            .map(|(dag_id, _)| *dag_id)
            .collect();
        for dag_id in owned {
            inner.dag_owners.remove(&dag_id);
            inner.dags.remove(&dag_id);
        }
        Ok(())
    }

    async fn replace_dag(&self, workflow_id: WorkflowId, dag: Dag) -> Result<Workflow, LedgerError> {
        let mut inner = self.inner.write().await;
        let dag_id = dag.id;
        let workflow = inner
            .workflows
            .get_mut(&workflow_id)
            .ok_or_else(|| LedgerError::not_found("workflow", workflow_id))?;
        workflow.replace_dag(dag_id);
        let updated = workflow.clone();
        inner.dag_owners.insert(dag_id, workflow_id);
        inner.dags.insert(dag_id, dag);
        Ok(updated)
    }

    async fn dag(&self, id: DagId) -> Result<Dag, LedgerError> {
        self.inner
            .read()
            .await
            .dags
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("dag", id))
    }

    async fn create_trigger(&self, trigger: WorkflowTrigger) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        if !inner.workflows.contains_key(&trigger.workflow_id) {
            return Err(LedgerError::not_found("workflow", trigger.workflow_id));
        }
        inner.triggers.insert(trigger.id, trigger);
        Ok(())
    }

    async fn trigger(&self, id: TriggerId) -> Result<WorkflowTrigger, LedgerError> {
        self.inner
            .read()
            .await
            .triggers
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("trigger", id))
    }

    async fn triggers_for(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowTrigger>, LedgerError> {
        let inner = self.inner.read().await;
        let mut triggers: Vec<WorkflowTrigger> = inner
            .triggers
            .values()
            .filter(|t| t.workflow_id == workflow_id)
            .cloned()
            .collect();
        triggers.sort_by(|a, b| a.id.as_ulid().cmp(&b.id.as_ulid()));
        Ok(triggers)
    }

    async fn update_trigger(&self, trigger: WorkflowTrigger) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .triggers
            .get_mut(&trigger.id)
            .ok_or_else(|| LedgerError::not_found("trigger", trigger.id))?;
        *entry = trigger;
        Ok(())
    }

    async fn delete_trigger(&self, id: TriggerId) -> Result<(), LedgerError> {
        self.inner
            .write()
            .await
            .triggers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::not_found("trigger", id))
    }

    async fn find_webhook_trigger(
        &self,
        token: &str,
    ) -> Result<Option<WorkflowTrigger>, LedgerError> {
        let inner = self.inner.read().await;
        Ok(inner
            .triggers
            .values()
            .find(|t| t.webhook_token() == Some(token))
            .cloned())
    }

    async fn cron_triggers(&self) -> Result<Vec<WorkflowTrigger>, LedgerError> {
        let inner = self.inner.read().await;
        let mut triggers: Vec<WorkflowTrigger> = inner
            .triggers
            .values()
            .filter(|t| t.enabled && t.trigger_type() == TriggerType::Cron)
            .filter(|t| {
                inner
                    .workflows
                    .get(&t.workflow_id)
                    .is_some_and(Workflow::is_enabled)
            })
            .cloned()
            .collect();
        triggers.sort_by(|a, b| a.id.as_ulid().cmp(&b.id.as_ulid()));
        Ok(triggers)
    }

    async fn create_job(&self, job: Job) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        if !inner.workflows.contains_key(&job.workflow_id) {
            return Err(LedgerError::not_found("workflow", job.workflow_id));
        }
        inner.jobs.insert(job.id, job);
        Ok(())
    }

    async fn job(&self, id: JobId) -> Result<Job, LedgerError> {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("job", id))
    }

    async fn jobs_for(&self, workflow_id: WorkflowId) -> Result<Vec<Job>, LedgerError> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.workflow_id == workflow_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.id.as_ulid().cmp(&a.id.as_ulid()));
        Ok(jobs)
    }

    async fn job_started(&self, id: JobId, steps: Vec<Step>) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        if job.state != JobState::Pending {
            return Err(LedgerError::Conflict {
                reason: format!("job {id} is not pending"),
            });
        }
        job.start();
        job.steps = steps;
        let workflow_id = job.workflow_id;
        if let Some(workflow) = inner.workflows.get_mut(&workflow_id) {
            workflow.counters.running += 1;
        }
        Ok(())
    }

    async fn job_finished(&self, id: JobId, state: JobState) -> Result<(), LedgerError> {
        if !state.is_terminal() {
            return Err(LedgerError::Conflict {
                reason: format!("{state:?} is not a terminal job state"),
            });
        }
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        if job.state != JobState::Running {
            return Err(LedgerError::Conflict {
                reason: format!("job {id} is not running"),
            });
        }
        job.finish(state);
        let workflow_id = job.workflow_id;
        // Counter adjustment is atomic with the transition: both happen
        // under the same write lock.
        if let Some(workflow) = inner.workflows.get_mut(&workflow_id) {
            workflow.counters.running = workflow.counters.running.saturating_sub(1);
            match state {
                JobState::Succeeded => workflow.counters.successful += 1,
                JobState::Failed => workflow.counters.failed += 1,
                JobState::Canceled => workflow.counters.canceled += 1,
                JobState::Pending | JobState::Running => unreachable!("terminal checked above"),
            }
        }
        Ok(())
    }

    async fn step_started(
        &self,
        job_id: JobId,
        node_id: &NodeId,
        input: JsonValue,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| LedgerError::not_found("job", job_id))?;
        let step = job
            .step_mut(node_id)
            .ok_or_else(|| LedgerError::not_found("step", node_id))?;
        if step.state != StepState::Pending {
            return Err(LedgerError::Conflict {
                reason: format!("step {node_id} already started"),
            });
        }
        step.start(input);
        Ok(())
    }

    async fn step_finished(
        &self,
        job_id: JobId,
        node_id: &NodeId,
        outcome: StepOutcome,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| LedgerError::not_found("job", job_id))?;
        let step = job
            .step_mut(node_id)
            .ok_or_else(|| LedgerError::not_found("step", node_id))?;
        if step.state.is_terminal() {
            return Err(LedgerError::Conflict {
                reason: format!("step {node_id} is already terminal"),
            });
        }
        match outcome {
            StepOutcome::Succeeded(output) => {
                if step.state != StepState::Running {
                    return Err(LedgerError::Conflict {
                        reason: format!("step {node_id} cannot succeed before starting"),
                    });
                }
                step.succeed(output);
            }
            StepOutcome::Failed(error) => {
                if step.state != StepState::Running {
                    return Err(LedgerError::Conflict {
                        reason: format!("step {node_id} cannot fail before starting"),
                    });
                }
                step.fail(error);
            }
            StepOutcome::Skipped(output) => step.skip(output),
        }
        Ok(())
    }
}
