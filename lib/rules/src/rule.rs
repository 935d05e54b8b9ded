//! Rule catalog entries.
//!
//! A rule is a bot-provided capability addressed as `bot@rule_id`.
//! Catalog entries carry the parameter schemas and an example payload
//! so the front end can render configuration forms and the executor can
//! check bindings before invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Whether a rule can sit in a trigger or an action node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Usable as the dag's trigger node.
    Trigger,
    /// Usable as an action node.
    Action,
}

/// A catalog entry describing one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInfo {
    /// Namespace of the providing bot.
    pub bot: String,
    /// Rule identifier within the bot.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// What the rule does.
    pub description: String,
    /// Trigger or action.
    pub kind: RuleKind,
    /// JSON schema for input parameters.
    pub input_schema: JsonValue,
    /// JSON schema for the produced output.
    pub output_schema: JsonValue,
    /// Example input payload, for form defaults.
    pub example_input: JsonValue,
}

impl RuleInfo {
    /// Creates an action rule entry with open schemas.
    #[must_use]
    pub fn action(bot: impl Into<String>, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(bot, id, title, RuleKind::Action)
    }

    /// Creates a trigger rule entry with open schemas.
    #[must_use]
    pub fn trigger(bot: impl Into<String>, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(bot, id, title, RuleKind::Trigger)
    }

    fn new(
        bot: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
        kind: RuleKind,
    ) -> Self {
        Self {
            bot: bot.into(),
            id: id.into(),
            title: title.into(),
            description: String::new(),
            kind,
            input_schema: serde_json::json!({}),
            output_schema: serde_json::json!({}),
            example_input: serde_json::json!({}),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }

    /// Sets the output schema.
    #[must_use]
    pub fn with_output_schema(mut self, schema: JsonValue) -> Self {
        self.output_schema = schema;
        self
    }

    /// Sets the example input payload.
    #[must_use]
    pub fn with_example(mut self, example: JsonValue) -> Self {
        self.example_input = example;
        self
    }

    /// Returns the parameter names the input schema marks as required.
    #[must_use]
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_builder() {
        let rule = RuleInfo::action("http", "webhook_post", "POST a webhook")
            .with_description("Sends the input as JSON to a URL")
            .with_input_schema(json!({
                "type": "object",
                "required": ["url"],
                "properties": {"url": {"type": "string"}}
            }))
            .with_example(json!({"url": "https://example.invalid"}));

        assert_eq!(rule.bot, "http");
        assert_eq!(rule.kind, RuleKind::Action);
        assert_eq!(rule.required_params(), vec!["url"]);
    }

    #[test]
    fn required_params_default_empty() {
        let rule = RuleInfo::action("dev", "echo", "Echo");
        assert!(rule.required_params().is_empty());
    }

    #[test]
    fn rule_serde_roundtrip() {
        let rule = RuleInfo::trigger("webhook", "incoming", "Incoming webhook");
        let json = serde_json::to_string(&rule).expect("serialize");
        let parsed: RuleInfo = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(rule, parsed);
    }
}
