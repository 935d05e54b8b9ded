//! The dag executor.
//!
//! Executes one job to a terminal state. Starting from the trigger node
//! (recorded as succeeded with the dispatch payload as its output), the
//! executor repeatedly:
//!
//! 1. skips nodes whose predecessors are all terminal with none
//!    succeeded (propagated to a fixpoint, so a failure skips exactly
//!    its downstream-only descendants)
//! 2. runs the wave of nodes whose predecessors are all terminal with
//!    at least one succeeded — concurrently, each bounded by the step
//!    timeout
//!
//! The job fails once no further node can run and any step failed;
//! otherwise it succeeds. The cancel flag is observed between waves;
//! results that arrive for a canceled job are recorded on skipped steps
//! and not actioned further.

use crate::engine::Engine;
use crate::error::ExecutionError;
use crate::ledger::StepOutcome;
use cogflow_core::JobId;
use cogflow_workflow::node::{Node, NodeId};
use cogflow_workflow::params::bind_parameters;
use cogflow_workflow::{Dag, Job, JobState, Step, StepState};
use futures::future::join_all;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use tokio::sync::watch;

impl Engine {
    /// Executes a pending job to completion and returns its final record.
    ///
    /// A failed *step* does not produce an error here — it is recorded
    /// on the job, which ends `failed`. Errors mean the machinery
    /// itself could not make progress.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] for unknown jobs, unresolvable
    /// dags, or ledger failures.
    pub async fn execute_job(&self, job_id: JobId) -> Result<Job, ExecutionError> {
        let job = self.ledger.job(job_id).await?;
        let dag = self.ledger.dag(job.dag_id).await?;
        let order = dag.traversal()?;

        let (tx, cancel) = watch::channel(false);
        self.cancels
            .lock()
            .expect("cancel registry poisoned")
            .insert(job_id, tx);

        let result = self
            .run_to_completion(job_id, &dag, &order, cancel, job.trigger_payload.clone())
            .await;

        self.cancels
            .lock()
            .expect("cancel registry poisoned")
            .remove(&job_id);

        result
    }

    async fn run_to_completion(
        &self,
        job_id: JobId,
        dag: &Dag,
        order: &[NodeId],
        cancel: watch::Receiver<bool>,
        payload: JsonValue,
    ) -> Result<Job, ExecutionError> {
        // Step records are installed up front, in traversal order, so
        // the job's step list is reproducible for identical dags.
        let steps = order
            .iter()
            .map(|node_id| Step::new(job_id, node_id.clone()))
            .collect();
        self.ledger.job_started(job_id, steps).await?;
        tracing::info!(job = %job_id, nodes = order.len(), "job started");

        // The trigger node completes immediately with the dispatch
        // payload as its output.
        let trigger_node = &order[0];
        self.ledger
            .step_started(job_id, trigger_node, payload.clone())
            .await?;
        self.ledger
            .step_finished(job_id, trigger_node, StepOutcome::Succeeded(payload.clone()))
            .await?;

        let mut states: HashMap<NodeId, StepState> = order
            .iter()
            .map(|node_id| (node_id.clone(), StepState::Pending))
            .collect();
        states.insert(trigger_node.clone(), StepState::Succeeded);
        let mut outputs: HashMap<NodeId, JsonValue> =
            HashMap::from([(trigger_node.clone(), payload)]);

        let final_state = loop {
            if *cancel.borrow() {
                break JobState::Canceled;
            }

            // Skip propagation to a fixpoint: skipping a node can make
            // its successors skippable in turn.
            loop {
                let skippable: Vec<&NodeId> = order
                    .iter()
                    .filter(|node_id| {
                        states[*node_id] == StepState::Pending && {
                            let preds = dag.predecessors(node_id);
                            preds.iter().all(|p| states[*p].is_terminal())
                                && !preds.iter().any(|p| states[*p] == StepState::Succeeded)
                        }
                    })
                    .collect();
                if skippable.is_empty() {
                    break;
                }
                for node_id in skippable {
                    tracing::debug!(job = %job_id, node = %node_id, "step skipped");
                    self.ledger
                        .step_finished(job_id, node_id, StepOutcome::Skipped(None))
                        .await?;
                    states.insert(node_id.clone(), StepState::Skipped);
                }
            }

            // The wave of nodes ready to run: every predecessor is
            // terminal and at least one succeeded.
            let wave: Vec<&NodeId> = order
                .iter()
                .filter(|node_id| {
                    states[*node_id] == StepState::Pending && {
                        let preds = dag.predecessors(node_id);
                        preds.iter().all(|p| states[*p].is_terminal())
                            && preds.iter().any(|p| states[*p] == StepState::Succeeded)
                    }
                })
                .collect();

            if wave.is_empty() {
                let failed = states.values().any(|s| *s == StepState::Failed);
                break if failed {
                    JobState::Failed
                } else {
                    JobState::Succeeded
                };
            }

            let mut invocations = Vec::with_capacity(wave.len());
            for node_id in wave {
                let node = dag
                    .node(node_id)
                    .ok_or_else(|| ExecutionError::UnknownNode {
                        node_id: node_id.clone(),
                    })?;
                let scope = predecessor_scope(dag, node_id, &outputs);
                let input = JsonValue::Object(bind_parameters(&node.parameters, &scope));
                self.ledger
                    .step_started(job_id, node_id, input.clone())
                    .await?;
                states.insert(node_id.clone(), StepState::Running);
                invocations.push(async move { (node_id, self.invoke_node(node, input).await) });
            }

            let results = join_all(invocations).await;

            // A cancel that landed while the wave was in flight: the
            // invocations were not interrupted, but their results are
            // recorded on skipped steps and not actioned further.
            let canceled = *cancel.borrow();
            for (node_id, result) in results {
                if canceled {
                    self.ledger
                        .step_finished(job_id, node_id, StepOutcome::Skipped(result.ok()))
                        .await?;
                    states.insert(node_id.clone(), StepState::Skipped);
                    continue;
                }
                match result {
                    Ok(output) => {
                        self.ledger
                            .step_finished(job_id, node_id, StepOutcome::Succeeded(output.clone()))
                            .await?;
                        states.insert(node_id.clone(), StepState::Succeeded);
                        outputs.insert(node_id.clone(), output);
                    }
                    Err(detail) => {
                        tracing::warn!(job = %job_id, node = %node_id, error = %detail, "step failed");
                        self.ledger
                            .step_finished(job_id, node_id, StepOutcome::Failed(detail))
                            .await?;
                        states.insert(node_id.clone(), StepState::Failed);
                    }
                }
            }

            if canceled {
                break JobState::Canceled;
            }
        };

        self.ledger.job_finished(job_id, final_state).await?;
        tracing::info!(job = %job_id, state = ?final_state, "job finished");
        self.ledger.job(job_id).await.map_err(Into::into)
    }

    /// Invokes one node's rule, bounded by the configured step timeout.
    ///
    /// Returns the error detail string to record on a failed step.
    async fn invoke_node(&self, node: &Node, input: JsonValue) -> Result<JsonValue, String> {
        let timeout = self.config.step_timeout;
        match tokio::time::timeout(timeout, self.rules.invoke(&node.bot, &node.rule_id, input))
            .await
        {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "StepTimeout: rule {}@{} did not complete within {}ms",
                node.bot,
                node.rule_id,
                timeout.as_millis()
            )),
        }
    }
}

/// Assembles the placeholder scope for a node: the union of its direct
/// predecessors' exported output keys. A predecessor with declared
/// variables exports only those keys; otherwise every key is exported.
/// Non-object outputs contribute nothing.
fn predecessor_scope(
    dag: &Dag,
    node_id: &NodeId,
    outputs: &HashMap<NodeId, JsonValue>,
) -> JsonMap<String, JsonValue> {
    let mut scope = JsonMap::new();
    for pred_id in dag.predecessors(node_id) {
        let Some(output) = outputs.get(pred_id) else {
            continue;
        };
        let Some(object) = output.as_object() else {
            continue;
        };
        let variables = dag.node(pred_id).map(|n| &n.variables);
        for (key, value) in object {
            let exported = variables.is_none_or(|vars| vars.is_empty() || vars.contains(key));
            if exported {
                scope.insert(key.clone(), value.clone());
            }
        }
    }
    scope
}
