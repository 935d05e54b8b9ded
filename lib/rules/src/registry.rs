//! Bot handler trait and the rule registry.
//!
//! The registry is the catalog consulted by the executor (to resolve
//! and invoke `bot@rule_id` bindings) and by the HTTP surface (to list
//! available actions for form rendering).

use crate::error::RuleError;
use crate::rule::RuleInfo;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// A bot: a namespace providing trigger/action rules.
#[async_trait]
pub trait BotHandler: Send + Sync {
    /// The bot namespace (e.g. "dev", "http").
    fn bot(&self) -> &str;

    /// The rules this bot provides.
    fn rules(&self) -> Vec<RuleInfo>;

    /// Invokes a rule with bound input parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule is unknown to this bot or the
    /// invocation fails.
    async fn invoke(&self, rule_id: &str, input: JsonValue) -> Result<JsonValue, RuleError>;
}

impl std::fmt::Debug for dyn BotHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHandler").field("bot", &self.bot()).finish()
    }
}

/// Catalog of registered bots and their rules.
#[derive(Default)]
pub struct RuleRegistry {
    handlers: HashMap<String, Arc<dyn BotHandler>>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bot handler, replacing any previous handler for the
    /// same namespace.
    pub fn register(&mut self, handler: Arc<dyn BotHandler>) {
        self.handlers.insert(handler.bot().to_string(), handler);
    }

    /// Resolves a `bot@rule_id` binding to its handler and catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownBot`] or [`RuleError::UnknownRule`].
    pub fn resolve(
        &self,
        bot: &str,
        rule_id: &str,
    ) -> Result<(Arc<dyn BotHandler>, RuleInfo), RuleError> {
        let handler = self
            .handlers
            .get(bot)
            .cloned()
            .ok_or_else(|| RuleError::UnknownBot {
                bot: bot.to_string(),
            })?;
        let info = handler
            .rules()
            .into_iter()
            .find(|rule| rule.id == rule_id)
            .ok_or_else(|| RuleError::UnknownRule {
                bot: bot.to_string(),
                rule_id: rule_id.to_string(),
            })?;
        Ok((handler, info))
    }

    /// Resolves, checks required parameters, and invokes a rule.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] from resolution, parameter checking, or
    /// the invocation itself.
    pub async fn invoke(
        &self,
        bot: &str,
        rule_id: &str,
        input: JsonValue,
    ) -> Result<JsonValue, RuleError> {
        let (handler, info) = self.resolve(bot, rule_id)?;
        check_required_params(&info, &input)?;
        tracing::debug!(bot, rule_id, "invoking rule");
        handler.invoke(rule_id, input).await
    }

    /// Returns every rule across all registered bots, sorted by
    /// `bot` then `id` for a stable catalog.
    #[must_use]
    pub fn catalog(&self) -> Vec<RuleInfo> {
        let mut rules: Vec<RuleInfo> = self
            .handlers
            .values()
            .flat_map(|handler| handler.rules())
            .collect();
        rules.sort_by(|a, b| a.bot.cmp(&b.bot).then_with(|| a.id.cmp(&b.id)));
        rules
    }
}

fn check_required_params(info: &RuleInfo, input: &JsonValue) -> Result<(), RuleError> {
    let required = info.required_params();
    if required.is_empty() {
        return Ok(());
    }
    let object = input.as_object().ok_or_else(|| RuleError::InvalidParams {
        reason: "input must be an object".to_string(),
    })?;
    for name in required {
        if !object.contains_key(name) {
            return Err(RuleError::InvalidParams {
                reason: format!("missing required parameter '{name}'"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticBot;

    #[async_trait]
    impl BotHandler for StaticBot {
        fn bot(&self) -> &str {
            "static"
        }

        fn rules(&self) -> Vec<RuleInfo> {
            vec![
                RuleInfo::action("static", "reply", "Reply").with_input_schema(json!({
                    "type": "object",
                    "required": ["text"]
                })),
            ]
        }

        async fn invoke(&self, rule_id: &str, input: JsonValue) -> Result<JsonValue, RuleError> {
            match rule_id {
                "reply" => Ok(json!({"replied": input["text"]})),
                _ => Err(RuleError::UnknownRule {
                    bot: "static".to_string(),
                    rule_id: rule_id.to_string(),
                }),
            }
        }
    }

    fn registry() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(StaticBot));
        registry
    }

    #[test]
    fn resolve_known_rule() {
        let (handler, info) = registry().resolve("static", "reply").expect("resolve");
        assert_eq!(handler.bot(), "static");
        assert_eq!(info.id, "reply");
    }

    #[test]
    fn resolve_unknown_bot() {
        let err = registry().resolve("ghost", "reply").unwrap_err();
        assert!(matches!(err, RuleError::UnknownBot { bot } if bot == "ghost"));
    }

    #[test]
    fn resolve_unknown_rule() {
        let err = registry().resolve("static", "ghost").unwrap_err();
        assert!(matches!(err, RuleError::UnknownRule { .. }));
    }

    #[tokio::test]
    async fn invoke_checks_required_params() {
        let err = registry()
            .invoke("static", "reply", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidParams { reason } if reason.contains("text")));
    }

    #[tokio::test]
    async fn invoke_passes_input_through() {
        let output = registry()
            .invoke("static", "reply", json!({"text": "hi"}))
            .await
            .expect("invoke");
        assert_eq!(output, json!({"replied": "hi"}));
    }

    #[test]
    fn catalog_is_sorted() {
        let rules = registry().catalog();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "reply");
    }
}
