//! The execution engine: trigger dispatch, cancellation and rerun.
//!
//! One engine serves the whole process. Dispatch entry points resolve a
//! trigger, enqueue a pending job and return it; callers decide whether
//! to run it inline ([`Engine::execute_job`]) or in the background
//! ([`Engine::spawn_job`]). Jobs for the same or different workflows
//! run concurrently with no ordering guarantee between them.

use crate::error::{DispatchError, ExecutionError};
use crate::ledger::Ledger;
use cogflow_core::{JobId, TriggerId};
use cogflow_rules::RuleRegistry;
use cogflow_workflow::{Job, Workflow, WorkflowTrigger};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for a single rule invocation. On expiry the step is
    /// failed with a timeout error instead of hanging the job.
    pub step_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(60),
        }
    }
}

/// The workflow execution engine.
pub struct Engine {
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) rules: Arc<RuleRegistry>,
    pub(crate) config: EngineConfig,
    /// Cooperative cancel flags for jobs currently executing here.
    pub(crate) cancels: Mutex<HashMap<JobId, watch::Sender<bool>>>,
}

impl Engine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>, rules: Arc<RuleRegistry>, config: EngineConfig) -> Self {
        Self {
            ledger,
            rules,
            config,
            cancels: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the ledger this engine records into.
    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Returns the rule registry.
    #[must_use]
    pub fn rules(&self) -> &Arc<RuleRegistry> {
        &self.rules
    }

    /// Webhook ingress: resolves the trigger by exact token match and
    /// enqueues a job with the payload bound to the trigger node.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unknown tokens, disabled
    /// triggers or inactive workflows. These are caller/config errors
    /// and are never retried.
    pub async fn on_webhook(&self, token: &str, payload: JsonValue) -> Result<Job, DispatchError> {
        let trigger = self
            .ledger
            .find_webhook_trigger(token)
            .await?
            .ok_or(DispatchError::TriggerNotFound)?;
        if !trigger.enabled {
            return Err(DispatchError::TriggerDisabled {
                id: trigger.id.to_string(),
            });
        }
        let workflow = self.active_workflow(&trigger).await?;
        self.enqueue(&workflow, &trigger, payload).await
    }

    /// Cron tick: enqueues a job for the trigger with an empty payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the trigger is unknown/disabled
    /// or the workflow is inactive.
    pub async fn on_cron(&self, trigger_id: TriggerId) -> Result<Job, DispatchError> {
        self.on_manual(trigger_id, JsonValue::Object(Default::default()))
            .await
    }

    /// Manual dispatch: enqueues a job for the trigger with the given
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the trigger is unknown/disabled
    /// or the workflow is inactive.
    pub async fn on_manual(
        &self,
        trigger_id: TriggerId,
        payload: JsonValue,
    ) -> Result<Job, DispatchError> {
        let trigger = self
            .ledger
            .trigger(trigger_id)
            .await
            .map_err(|_| DispatchError::TriggerNotFound)?;
        if !trigger.enabled {
            return Err(DispatchError::TriggerDisabled {
                id: trigger.id.to_string(),
            });
        }
        let workflow = self.active_workflow(&trigger).await?;
        self.enqueue(&workflow, &trigger, payload).await
    }

    /// Creates a brand-new job re-executing the same dag revision with
    /// the original trigger payload. The original job is not touched.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] if the original job is unknown.
    pub async fn rerun(&self, job_id: JobId) -> Result<Job, ExecutionError> {
        let original = self.ledger.job(job_id).await?;
        let job = Job::new(
            original.workflow_id,
            original.dag_id,
            original.trigger_id,
            original.script_version,
            original.trigger_payload.clone(),
        );
        self.ledger.create_job(job.clone()).await?;
        tracing::info!(original = %job_id, job = %job.id, "job rerun enqueued");
        Ok(job)
    }

    /// Requests cooperative cancellation of a running job.
    ///
    /// The flag is observed between node invocations; an
    /// already-dispatched rule invocation is not interrupted, but its
    /// result is recorded on a skipped step and not actioned further.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::JobNotRunning`] if the job is not
    /// currently executing.
    pub async fn cancel(&self, job_id: JobId) -> Result<(), ExecutionError> {
        let sent = {
            let cancels = self.cancels.lock().expect("cancel registry poisoned");
            cancels.get(&job_id).map(|tx| tx.send(true))
        };
        if let Some(Ok(())) = sent {
            tracing::info!(job = %job_id, "cancel requested");
            return Ok(());
        }
        // Distinguish unknown jobs from jobs that simply are not
        // executing here (pending or already terminal).
        let _job = self.ledger.job(job_id).await?;
        Err(ExecutionError::JobNotRunning { id: job_id })
    }

    /// Runs a pending job on a background task.
    pub fn spawn_job(self: &Arc<Self>, job_id: JobId) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = engine.execute_job(job_id).await {
                tracing::error!(job = %job_id, error = %e, "job execution error");
            }
        });
    }

    async fn active_workflow(
        &self,
        trigger: &WorkflowTrigger,
    ) -> Result<Workflow, DispatchError> {
        let workflow = self.ledger.workflow(trigger.workflow_id).await?;
        if !workflow.is_enabled() {
            return Err(DispatchError::WorkflowDisabled {
                id: workflow.id.to_string(),
            });
        }
        Ok(workflow)
    }

    async fn enqueue(
        &self,
        workflow: &Workflow,
        trigger: &WorkflowTrigger,
        payload: JsonValue,
    ) -> Result<Job, DispatchError> {
        let job = Job::new(
            workflow.id,
            workflow.dag_id,
            trigger.id,
            workflow.version,
            payload,
        );
        self.ledger.create_job(job.clone()).await?;
        tracing::info!(
            workflow = %workflow.id,
            trigger = %trigger.id,
            job = %job.id,
            "job enqueued"
        );
        Ok(job)
    }
}
