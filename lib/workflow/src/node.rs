//! Workflow node types.
//!
//! Nodes are the building blocks of a dag. Each node has:
//! - An identifier unique within its dag (supplied by the script author)
//! - A kind (trigger or action)
//! - A bound rule (`bot` + `rule_id`)
//! - An open parameter map and the variable names it exports downstream

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

/// Identifier of a node within one dag.
///
/// Unlike entity ids, node ids are author-supplied strings (task names
/// from the workflow script), so uniqueness is enforced by dag
/// validation rather than by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point of the dag; completes with the dispatch payload.
    Trigger,
    /// A rule invocation executed by the engine.
    Action,
}

/// Display metadata carried for the editor front end.
///
/// The executor never reads these fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDisplay {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier unique within the dag.
    pub id: NodeId,
    /// Trigger or action.
    pub kind: NodeKind,
    /// Namespace of the rule provider.
    pub bot: String,
    /// Rule identifier within the bot.
    pub rule_id: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Configured parameters; `{{name}}` placeholders are substituted
    /// from predecessor outputs at execution time.
    #[serde(default)]
    pub parameters: JsonMap<String, JsonValue>,
    /// Output keys this node exports to downstream placeholder scopes.
    /// Empty means every output key is exported.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Editor positioning, ignored by the executor.
    #[serde(default)]
    pub display: NodeDisplay,
}

impl Node {
    /// Creates a trigger node bound to the given rule.
    #[must_use]
    pub fn trigger(id: impl Into<NodeId>, bot: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Trigger, bot, rule_id)
    }

    /// Creates an action node bound to the given rule.
    #[must_use]
    pub fn action(id: impl Into<NodeId>, bot: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Action, bot, rule_id)
    }

    fn new(
        id: impl Into<NodeId>,
        kind: NodeKind,
        bot: impl Into<String>,
        rule_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            bot: bot.into(),
            rule_id: rule_id.into(),
            label: None,
            parameters: JsonMap::new(),
            variables: Vec::new(),
            display: NodeDisplay::default(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Sets all parameters at once.
    #[must_use]
    pub fn with_parameters(mut self, parameters: JsonMap<String, JsonValue>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Declares the exported variable names.
    #[must_use]
    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    /// Returns true if this is the trigger node.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.kind == NodeKind::Trigger
    }
}
