//! Polling runner that fires due cron triggers.
//!
//! Each poll computes the window since the previous tick and dispatches
//! every enabled cron trigger whose schedule fires inside it. Dispatch
//! failures are logged and skipped; a broken trigger must not stall the
//! others.

use crate::schedule::CronSchedule;
use chrono::{DateTime, Utc};
use cogflow_engine::Engine;
use cogflow_workflow::TriggerKind;
use std::sync::Arc;
use std::time::Duration;

/// Background runner for cron triggers.
pub struct CronRunner {
    engine: Arc<Engine>,
    poll_interval: Duration,
}

impl CronRunner {
    /// Creates a runner polling at the given interval.
    #[must_use]
    pub fn new(engine: Arc<Engine>, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
        }
    }

    /// Runs the polling loop forever.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        // The first tick fires immediately; consume it so the first
        // real window starts now.
        interval.tick().await;
        let mut window_start = Utc::now();

        loop {
            interval.tick().await;
            let window_end = Utc::now();
            self.tick(window_start, window_end).await;
            window_start = window_end;
        }
    }

    /// Dispatches every cron trigger due in `(after, until]`.
    pub async fn tick(&self, after: DateTime<Utc>, until: DateTime<Utc>) {
        let triggers = match self.engine.ledger().cron_triggers().await {
            Ok(triggers) => triggers,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list cron triggers");
                return;
            }
        };

        for trigger in triggers {
            let TriggerKind::Cron { spec } = &trigger.kind else {
                continue;
            };
            let schedule = match CronSchedule::parse(spec) {
                Ok(schedule) => schedule,
                Err(e) => {
                    tracing::warn!(trigger = %trigger.id, error = %e, "invalid cron spec");
                    continue;
                }
            };
            if !schedule.fires_between(after, until) {
                continue;
            }

            match self.engine.on_cron(trigger.id).await {
                Ok(job) => {
                    tracing::info!(trigger = %trigger.id, job = %job.id, "cron trigger fired");
                    self.engine.spawn_job(job.id);
                }
                Err(e) => {
                    tracing::warn!(trigger = %trigger.id, error = %e, "cron dispatch failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cogflow_engine::{EngineConfig, Ledger, MemoryLedger};
    use cogflow_rules::{MockBot, MockResponse, RuleRegistry};
    use cogflow_workflow::{
        Dag, Edge, Node, ScriptLang, Workflow, WorkflowScript, WorkflowTrigger,
    };
    use serde_json::json;

    async fn engine_with_cron(spec: &str) -> (Arc<Engine>, Workflow) {
        let ledger = Arc::new(MemoryLedger::new());
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(
            MockBot::new("mock").with_rule("ok", MockResponse::Succeed(json!({}))),
        ));

        let mut dag = Dag::new();
        dag.add_node(Node::trigger("trigger", "mock", "start"));
        dag.add_node(Node::action("a", "mock", "ok"));
        dag.add_edge(Edge::numbered(1, "trigger", "a"));

        let workflow = Workflow::new(
            "cron test",
            None,
            WorkflowScript::new(ScriptLang::Yaml, "name: cron test"),
            dag.id,
        );
        let trigger = WorkflowTrigger::new(
            workflow.id,
            TriggerKind::Cron {
                spec: spec.to_string(),
            },
        );
        ledger
            .create_workflow(workflow.clone(), dag, vec![trigger])
            .await
            .expect("create workflow");

        let engine = Arc::new(Engine::new(ledger, Arc::new(registry), EngineConfig::default()));
        (engine, workflow)
    }

    #[tokio::test]
    async fn tick_dispatches_due_trigger() {
        let (engine, workflow) = engine_with_cron("* * * * *").await;
        let runner = CronRunner::new(engine.clone(), Duration::from_secs(30));

        let after = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap();
        runner.tick(after, until).await;

        let jobs = engine.ledger().jobs_for(workflow.id).await.expect("jobs");
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn tick_skips_trigger_outside_window() {
        let (engine, workflow) = engine_with_cron("0 7 * * *").await;
        let runner = CronRunner::new(engine.clone(), Duration::from_secs(30));

        let after = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();
        runner.tick(after, until).await;

        let jobs = engine.ledger().jobs_for(workflow.id).await.expect("jobs");
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn tick_skips_disabled_workflow() {
        let (engine, workflow) = engine_with_cron("* * * * *").await;

        let mut disabled = workflow.clone();
        disabled.disable();
        engine
            .ledger()
            .update_workflow(disabled)
            .await
            .expect("update");

        let runner = CronRunner::new(engine.clone(), Duration::from_secs(30));
        let after = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap();
        runner.tick(after, until).await;

        let jobs = engine.ledger().jobs_for(workflow.id).await.expect("jobs");
        assert!(jobs.is_empty());
    }
}
