//! Trigger types for workflow initiation.
//!
//! Triggers bind a workflow to an event source. They are stored
//! separately from the dag so the dispatcher can look them up without
//! loading graphs, and their lifecycle is independent of jobs.

use chrono::{DateTime, Utc};
use cogflow_core::{TriggerId, WorkflowId};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// The type of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// HTTP webhook ingress, matched by token.
    Webhook,
    /// Cron schedule.
    Cron,
    /// User-initiated via the API.
    Manual,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Webhook => "webhook",
            Self::Cron => "cron",
            Self::Manual => "manual",
        };
        write!(f, "{name}")
    }
}

/// Kind-specific trigger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerKind {
    /// HTTP webhook trigger; the token is the exact-match routing key.
    Webhook {
        /// Opaque ingress token, unique per trigger.
        token: String,
    },
    /// Cron trigger with a 5-field expression, evaluated in UTC.
    Cron {
        /// Cron expression (e.g. "0 7 * * *" for 7am daily).
        spec: String,
    },
    /// Manual trigger (user-initiated).
    Manual,
}

impl TriggerKind {
    /// Creates a webhook kind with a freshly generated token.
    #[must_use]
    pub fn webhook() -> Self {
        Self::Webhook {
            token: Ulid::new().to_string().to_lowercase(),
        }
    }
}

/// A configured trigger bound to a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTrigger {
    /// Unique identifier for this trigger.
    pub id: TriggerId,
    /// The workflow this trigger belongs to.
    pub workflow_id: WorkflowId,
    /// Kind-specific configuration.
    pub kind: TriggerKind,
    /// Whether this trigger is currently enabled.
    pub enabled: bool,
    /// When this trigger was created.
    pub created_at: DateTime<Utc>,
    /// When this trigger was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTrigger {
    /// Creates a new enabled trigger.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, kind: TriggerKind) -> Self {
        let now = Utc::now();
        Self {
            id: TriggerId::new(),
            workflow_id,
            kind,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the trigger type.
    #[must_use]
    pub fn trigger_type(&self) -> TriggerType {
        match &self.kind {
            TriggerKind::Webhook { .. } => TriggerType::Webhook,
            TriggerKind::Cron { .. } => TriggerType::Cron,
            TriggerKind::Manual => TriggerType::Manual,
        }
    }

    /// Returns the webhook token, if this is a webhook trigger.
    #[must_use]
    pub fn webhook_token(&self) -> Option<&str> {
        match &self.kind {
            TriggerKind::Webhook { token } => Some(token),
            _ => None,
        }
    }

    /// Enables this trigger.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.updated_at = Utc::now();
    }

    /// Disables this trigger.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_trigger_gets_unique_token() {
        let workflow_id = WorkflowId::new();
        let t1 = WorkflowTrigger::new(workflow_id, TriggerKind::webhook());
        let t2 = WorkflowTrigger::new(workflow_id, TriggerKind::webhook());

        assert_eq!(t1.trigger_type(), TriggerType::Webhook);
        assert_ne!(t1.webhook_token(), t2.webhook_token());
    }

    #[test]
    fn cron_trigger_creation() {
        let trigger = WorkflowTrigger::new(
            WorkflowId::new(),
            TriggerKind::Cron {
                spec: "0 7 * * *".to_string(),
            },
        );
        assert_eq!(trigger.trigger_type(), TriggerType::Cron);
        assert!(trigger.enabled);
        assert!(trigger.webhook_token().is_none());
    }

    #[test]
    fn trigger_enable_disable() {
        let mut trigger = WorkflowTrigger::new(WorkflowId::new(), TriggerKind::Manual);
        assert!(trigger.enabled);

        trigger.disable();
        assert!(!trigger.enabled);

        trigger.enable();
        assert!(trigger.enabled);
    }

    #[test]
    fn trigger_serde_roundtrip() {
        let trigger = WorkflowTrigger::new(WorkflowId::new(), TriggerKind::webhook());
        let json = serde_json::to_string(&trigger).expect("serialize");
        let parsed: WorkflowTrigger = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(trigger, parsed);
    }
}
