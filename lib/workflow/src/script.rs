//! Declarative workflow scripts and their compilation into dags.
//!
//! A script is the source-of-truth form of a workflow. The YAML dialect
//! carries metadata, trigger declarations, a pipeline (edge list in
//! `source -> target` form) and tasks (nodes bound to `bot@rule_id`
//! actions). Compilation validates the document and produces a dag that
//! itself passes full graph validation; nothing invalid is ever
//! persisted.

use crate::dag::Dag;
use crate::edge::Edge;
use crate::error::ScriptError;
use crate::node::{Node, NodeKind};
use crate::trigger::TriggerKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::str::FromStr;

const ARROW: &str = "->";

/// The dialect a script is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptLang {
    /// The YAML workflow dialect.
    Yaml,
}

/// A declarative workflow script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowScript {
    /// The dialect of `source`.
    pub lang: ScriptLang,
    /// The script text.
    pub source: String,
}

impl WorkflowScript {
    /// Creates a new script.
    #[must_use]
    pub fn new(lang: ScriptLang, source: impl Into<String>) -> Self {
        Self {
            lang,
            source: source.into(),
        }
    }

    /// Compiles the script into workflow metadata, trigger specs and a
    /// validated dag.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptError`] describing the first problem found.
    pub fn compile(&self) -> Result<CompiledScript, ScriptError> {
        match self.lang {
            ScriptLang::Yaml => compile_yaml(&self.source),
        }
    }
}

/// A trigger declaration from a script, before ids/tokens are minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Webhook ingress; a token is generated when the trigger is created.
    Webhook,
    /// Cron schedule.
    Cron {
        /// 5-field cron expression.
        spec: String,
    },
    /// Manual dispatch.
    Manual,
}

impl TriggerSpec {
    /// Materializes the spec into trigger configuration, minting a
    /// webhook token where needed.
    #[must_use]
    pub fn into_kind(self) -> TriggerKind {
        match self {
            Self::Webhook => TriggerKind::webhook(),
            Self::Cron { spec } => TriggerKind::Cron { spec },
            Self::Manual => TriggerKind::Manual,
        }
    }
}

/// The result of compiling a script.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    /// Workflow name.
    pub name: String,
    /// Workflow description.
    pub description: Option<String>,
    /// Declared triggers, in document order.
    pub triggers: Vec<TriggerSpec>,
    /// The compiled, validated dag.
    pub dag: Dag,
}

/// Validates a 5-field cron expression.
///
/// The `cron` crate parses 6/7-field expressions (with seconds), so a
/// zero seconds field is prepended before parsing.
pub fn validate_cron_spec(spec: &str) -> Result<(), ScriptError> {
    let parts = spec.split_whitespace().count();
    if parts != 5 {
        return Err(ScriptError::InvalidCronSpec {
            spec: spec.to_string(),
            reason: format!("expected 5 fields, got {parts}"),
        });
    }
    cron::Schedule::from_str(&format!("0 {spec}")).map_err(|e| ScriptError::InvalidCronSpec {
        spec: spec.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ScriptDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    describe: Option<String>,
    #[serde(default)]
    triggers: Vec<ScriptTrigger>,
    #[serde(default)]
    pipeline: Vec<String>,
    #[serde(default)]
    tasks: Vec<ScriptTask>,
}

#[derive(Debug, Deserialize)]
struct ScriptTrigger {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    rule: JsonMap<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct ScriptTask {
    id: String,
    action: String,
    #[serde(default)]
    describe: Option<String>,
    #[serde(default)]
    params: JsonMap<String, JsonValue>,
    #[serde(default)]
    vars: Vec<String>,
}

fn compile_yaml(source: &str) -> Result<CompiledScript, ScriptError> {
    let doc: ScriptDoc = serde_yaml::from_str(source).map_err(|e| ScriptError::Parse {
        message: e.to_string(),
    })?;

    if doc.name.trim().is_empty() {
        return Err(ScriptError::MissingName);
    }
    if doc.triggers.is_empty() {
        return Err(ScriptError::NoTriggers);
    }
    if doc.pipeline.is_empty() {
        return Err(ScriptError::EmptyPipeline);
    }
    if doc.tasks.is_empty() {
        return Err(ScriptError::NoTasks);
    }

    let mut triggers = Vec::with_capacity(doc.triggers.len());
    for trigger in &doc.triggers {
        triggers.push(parse_trigger(trigger)?);
    }

    // The first task is the trigger node; the rest are actions.
    let mut nodes = Vec::with_capacity(doc.tasks.len());
    for (index, task) in doc.tasks.iter().enumerate() {
        let (bot, rule_id) = parse_action(&task.action)?;
        let kind = if index == 0 {
            NodeKind::Trigger
        } else {
            NodeKind::Action
        };
        let mut node = match kind {
            NodeKind::Trigger => Node::trigger(task.id.as_str(), bot, rule_id),
            NodeKind::Action => Node::action(task.id.as_str(), bot, rule_id),
        };
        node.parameters = task.params.clone();
        node.variables = task.vars.clone();
        node.label = task.describe.clone();
        nodes.push(node);
    }

    let mut edges = Vec::new();
    for line in &doc.pipeline {
        for (source_id, target_id) in parse_pipeline_line(line)? {
            edges.push(Edge::numbered(edges.len() + 1, source_id, target_id));
        }
    }

    let dag = Dag::from_parts(nodes, edges);
    dag.validate()?;

    Ok(CompiledScript {
        name: doc.name.trim().to_string(),
        description: doc.describe.clone(),
        triggers,
        dag,
    })
}

fn parse_trigger(trigger: &ScriptTrigger) -> Result<TriggerSpec, ScriptError> {
    match trigger.kind.as_str() {
        "webhook" => Ok(TriggerSpec::Webhook),
        "manual" => Ok(TriggerSpec::Manual),
        "cron" => {
            let spec = trigger
                .rule
                .get("spec")
                .and_then(JsonValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(ScriptError::MissingCronSpec)?;
            validate_cron_spec(spec)?;
            Ok(TriggerSpec::Cron {
                spec: spec.to_string(),
            })
        }
        other => Err(ScriptError::UnknownTriggerType {
            value: other.to_string(),
        }),
    }
}

/// Parses a `bot@rule_id` action reference.
fn parse_action(action: &str) -> Result<(&str, &str), ScriptError> {
    let invalid = || ScriptError::InvalidAction {
        action: action.to_string(),
    };
    let (bot, rule_id) = action.split_once('@').ok_or_else(invalid)?;
    let well_formed =
        |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '_');
    if !well_formed(bot) || !well_formed(rule_id) {
        return Err(invalid());
    }
    Ok((bot, rule_id))
}

/// Parses one pipeline line into consecutive edges.
///
/// A line is a chain of node ids joined by `->`, e.g. `a -> b -> c`.
fn parse_pipeline_line(line: &str) -> Result<Vec<(String, String)>, ScriptError> {
    let segments: Vec<&str> = line.split(ARROW).map(str::trim).collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(ScriptError::InvalidPipeline {
            line: line.to_string(),
        });
    }
    Ok(segments
        .windows(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    const EXAMPLE: &str = r#"
name: notify
describe: forward incoming payloads
triggers:
  - type: webhook
  - type: cron
    rule:
      spec: "0 7 * * *"
pipeline:
  - trigger -> echo
  - echo -> post
tasks:
  - id: trigger
    action: webhook@incoming
  - id: echo
    action: dev@echo
    params:
      x: 1
    vars: [x]
  - id: post
    action: http@webhook_post
    params:
      url: "https://example.invalid/hook"
"#;

    #[test]
    fn compile_example_script() {
        let script = WorkflowScript::new(ScriptLang::Yaml, EXAMPLE);
        let compiled = script.compile().expect("compile");

        assert_eq!(compiled.name, "notify");
        assert_eq!(
            compiled.description.as_deref(),
            Some("forward incoming payloads")
        );
        assert_eq!(compiled.triggers.len(), 2);
        assert_eq!(compiled.dag.node_count(), 3);
        assert_eq!(compiled.dag.edge_count(), 2);

        let trigger = compiled.dag.trigger_node().expect("trigger node");
        assert_eq!(trigger.id.as_str(), "trigger");
        assert_eq!(trigger.bot, "webhook");

        let echo = compiled
            .dag
            .node(&"echo".into())
            .expect("echo node");
        assert_eq!(echo.kind, NodeKind::Action);
        assert_eq!(echo.parameters["x"], 1);
        assert_eq!(echo.variables, vec!["x"]);
    }

    #[test]
    fn compile_rejects_missing_name() {
        let script = WorkflowScript::new(ScriptLang::Yaml, "describe: no name");
        assert!(matches!(script.compile(), Err(ScriptError::MissingName)));
    }

    #[test]
    fn compile_rejects_missing_triggers() {
        let source = "name: x\npipeline: [a -> b]\ntasks: [{id: a, action: dev@echo}]";
        let script = WorkflowScript::new(ScriptLang::Yaml, source);
        assert!(matches!(script.compile(), Err(ScriptError::NoTriggers)));
    }

    #[test]
    fn compile_rejects_unknown_trigger_type() {
        let source = r#"
name: x
triggers: [{type: carrier_pigeon}]
pipeline: [a -> b]
tasks: [{id: a, action: dev@echo}, {id: b, action: dev@echo}]
"#;
        let script = WorkflowScript::new(ScriptLang::Yaml, source);
        assert!(matches!(
            script.compile(),
            Err(ScriptError::UnknownTriggerType { value }) if value == "carrier_pigeon"
        ));
    }

    #[test]
    fn compile_rejects_bad_cron_spec() {
        let source = r#"
name: x
triggers: [{type: cron, rule: {spec: "not a cron"}}]
pipeline: [a -> b]
tasks: [{id: a, action: dev@echo}, {id: b, action: dev@echo}]
"#;
        let script = WorkflowScript::new(ScriptLang::Yaml, source);
        assert!(matches!(
            script.compile(),
            Err(ScriptError::InvalidCronSpec { .. })
        ));
    }

    #[test]
    fn compile_rejects_bad_action_reference() {
        let source = r#"
name: x
triggers: [{type: manual}]
pipeline: [a -> b]
tasks: [{id: a, action: no_at_sign}, {id: b, action: dev@echo}]
"#;
        let script = WorkflowScript::new(ScriptLang::Yaml, source);
        assert!(matches!(
            script.compile(),
            Err(ScriptError::InvalidAction { .. })
        ));
    }

    #[test]
    fn compile_rejects_malformed_pipeline_line() {
        let source = r#"
name: x
triggers: [{type: manual}]
pipeline: ["a ->"]
tasks: [{id: a, action: dev@echo}]
"#;
        let script = WorkflowScript::new(ScriptLang::Yaml, source);
        assert!(matches!(
            script.compile(),
            Err(ScriptError::InvalidPipeline { .. })
        ));
    }

    #[test]
    fn compile_rejects_cyclic_graph() {
        let source = r#"
name: x
triggers: [{type: manual}]
pipeline:
  - trigger -> a
  - a -> b
  - b -> a
tasks:
  - {id: trigger, action: dev@echo}
  - {id: a, action: dev@echo}
  - {id: b, action: dev@echo}
"#;
        let script = WorkflowScript::new(ScriptLang::Yaml, source);
        assert!(matches!(
            script.compile(),
            Err(ScriptError::Graph(GraphError::CycleDetected))
        ));
    }

    #[test]
    fn pipeline_chain_produces_consecutive_edges() {
        let edges = parse_pipeline_line("a -> b -> c").unwrap();
        assert_eq!(
            edges,
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string())
            ]
        );
    }

    #[test]
    fn cron_spec_must_have_five_fields() {
        assert!(validate_cron_spec("0 7 * * *").is_ok());
        assert!(validate_cron_spec("0 7 * *").is_err());
        assert!(validate_cron_spec("0 7 * * * *").is_err());
    }

    #[test]
    fn webhook_spec_materializes_with_token() {
        let kind = TriggerSpec::Webhook.into_kind();
        assert!(matches!(kind, TriggerKind::Webhook { token } if !token.is_empty()));
    }
}
