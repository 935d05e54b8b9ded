//! Rule registry for the cogflow platform.
//!
//! Bots provide trigger/action rules addressed as `bot@rule_id`. The
//! registry is the catalog consulted by the executor to bind and invoke
//! rules, and by the HTTP surface to render configuration forms.

pub mod builtin;
pub mod error;
pub mod registry;
pub mod rule;

pub use builtin::{DevBot, HttpBot, MockBot, MockResponse, WebhookBot};
pub use error::RuleError;
pub use registry::{BotHandler, RuleRegistry};
pub use rule::{RuleInfo, RuleKind};

use std::sync::Arc;

/// Builds a registry with every built-in bot registered.
#[must_use]
pub fn builtin_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register(Arc::new(DevBot));
    registry.register(Arc::new(WebhookBot));
    registry.register(Arc::new(HttpBot::new()));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_all_bots() {
        let registry = builtin_registry();
        assert!(registry.resolve("dev", "echo").is_ok());
        assert!(registry.resolve("webhook", "incoming").is_ok());
        assert!(registry.resolve("http", "webhook_post").is_ok());
    }
}
