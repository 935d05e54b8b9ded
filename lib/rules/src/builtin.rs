//! Built-in bots.
//!
//! - `dev`: echo/fail/sleep rules for development and testing
//! - `webhook`: the trigger rule webhook-dispatched dags bind to
//! - `http`: outbound JSON POST

use crate::error::RuleError;
use crate::registry::BotHandler;
use crate::rule::RuleInfo;
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Development bot: deterministic rules for wiring and testing flows.
pub struct DevBot;

#[async_trait]
impl BotHandler for DevBot {
    fn bot(&self) -> &str {
        "dev"
    }

    fn rules(&self) -> Vec<RuleInfo> {
        vec![
            RuleInfo::action("dev", "echo", "Echo")
                .with_description("Returns its input unchanged")
                .with_example(json!({"message": "hello"})),
            RuleInfo::action("dev", "fail", "Fail")
                .with_description("Always fails, with an optional `message` parameter")
                .with_example(json!({"message": "boom"})),
            RuleInfo::action("dev", "sleep", "Sleep")
                .with_description("Sleeps `ms` milliseconds, then echoes its input")
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"ms": {"type": "number"}}
                }))
                .with_example(json!({"ms": 100})),
        ]
    }

    async fn invoke(&self, rule_id: &str, input: JsonValue) -> Result<JsonValue, RuleError> {
        match rule_id {
            "echo" => Ok(input),
            "fail" => {
                let message = input
                    .get("message")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("dev@fail invoked");
                Err(RuleError::Invocation {
                    message: message.to_string(),
                })
            }
            "sleep" => {
                let ms = input.get("ms").and_then(JsonValue::as_u64).unwrap_or(10);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(input)
            }
            _ => Err(RuleError::UnknownRule {
                bot: "dev".to_string(),
                rule_id: rule_id.to_string(),
            }),
        }
    }
}

/// Webhook bot: provides the trigger rule webhook dags bind to.
///
/// The rule is never invoked by the executor (trigger steps complete
/// with the dispatch payload); it exists so scripts can reference
/// `webhook@incoming` and the catalog can describe it.
pub struct WebhookBot;

#[async_trait]
impl BotHandler for WebhookBot {
    fn bot(&self) -> &str {
        "webhook"
    }

    fn rules(&self) -> Vec<RuleInfo> {
        vec![
            RuleInfo::trigger("webhook", "incoming", "Incoming webhook")
                .with_description("Starts a job with the webhook payload as trigger output")
                .with_example(json!({"any": "payload"})),
        ]
    }

    async fn invoke(&self, rule_id: &str, input: JsonValue) -> Result<JsonValue, RuleError> {
        match rule_id {
            "incoming" => Ok(input),
            _ => Err(RuleError::UnknownRule {
                bot: "webhook".to_string(),
                rule_id: rule_id.to_string(),
            }),
        }
    }
}

/// HTTP bot: outbound requests to external services.
pub struct HttpBot {
    client: reqwest::Client,
}

impl HttpBot {
    /// Creates the bot with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpBot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BotHandler for HttpBot {
    fn bot(&self) -> &str {
        "http"
    }

    fn rules(&self) -> Vec<RuleInfo> {
        vec![
            RuleInfo::action("http", "webhook_post", "POST JSON")
                .with_description("POSTs the `body` parameter as JSON to `url`")
                .with_input_schema(json!({
                    "type": "object",
                    "required": ["url"],
                    "properties": {
                        "url": {"type": "string"},
                        "body": {}
                    }
                }))
                .with_output_schema(json!({
                    "type": "object",
                    "properties": {
                        "status": {"type": "number"},
                        "body": {}
                    }
                }))
                .with_example(json!({"url": "https://example.invalid/hook", "body": {}})),
        ]
    }

    async fn invoke(&self, rule_id: &str, input: JsonValue) -> Result<JsonValue, RuleError> {
        match rule_id {
            "webhook_post" => {
                let url = input
                    .get("url")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| RuleError::InvalidParams {
                        reason: "missing required parameter 'url'".to_string(),
                    })?;
                let body = input.get("body").cloned().unwrap_or(JsonValue::Null);

                let response = self
                    .client
                    .post(url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| RuleError::Invocation {
                        message: format!("request failed: {e}"),
                    })?;

                let status = response.status().as_u16();
                let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);
                Ok(json!({"status": status, "body": body}))
            }
            _ => Err(RuleError::UnknownRule {
                bot: "http".to_string(),
                rule_id: rule_id.to_string(),
            }),
        }
    }
}

/// Scripted responses for [`MockBot`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Succeed with the given output.
    Succeed(JsonValue),
    /// Fail with the given message.
    Fail(String),
    /// Sleep for the duration, then succeed with the output.
    Hang(Duration, JsonValue),
}

/// A configurable bot for exercising the executor.
///
/// Responses are keyed by rule id; every invocation is recorded so
/// tests can assert what ran.
pub struct MockBot {
    bot: String,
    responses: HashMap<String, MockResponse>,
    invocations: Mutex<Vec<String>>,
}

impl MockBot {
    /// Creates a mock bot with the given namespace.
    #[must_use]
    pub fn new(bot: impl Into<String>) -> Self {
        Self {
            bot: bot.into(),
            responses: HashMap::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the response for a rule id.
    #[must_use]
    pub fn with_rule(mut self, rule_id: impl Into<String>, response: MockResponse) -> Self {
        self.responses.insert(rule_id.into(), response);
        self
    }

    /// Returns the rule ids invoked so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl BotHandler for MockBot {
    fn bot(&self) -> &str {
        &self.bot
    }

    fn rules(&self) -> Vec<RuleInfo> {
        self.responses
            .keys()
            .map(|rule_id| RuleInfo::action(self.bot.clone(), rule_id.clone(), rule_id.clone()))
            .collect()
    }

    async fn invoke(&self, rule_id: &str, _input: JsonValue) -> Result<JsonValue, RuleError> {
        self.invocations
            .lock()
            .expect("mock lock poisoned")
            .push(rule_id.to_string());

        match self.responses.get(rule_id) {
            Some(MockResponse::Succeed(output)) => Ok(output.clone()),
            Some(MockResponse::Fail(message)) => Err(RuleError::Invocation {
                message: message.clone(),
            }),
            Some(MockResponse::Hang(duration, output)) => {
                tokio::time::sleep(*duration).await;
                Ok(output.clone())
            }
            None => Err(RuleError::UnknownRule {
                bot: self.bot.clone(),
                rule_id: rule_id.to_string(),
            }),
        }
    }
}
