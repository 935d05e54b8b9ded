//! Error types for the rules crate.

use std::fmt;

/// Errors from rule resolution and invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// No handler is registered for the bot namespace.
    UnknownBot { bot: String },
    /// The bot exists but does not provide the rule.
    UnknownRule { bot: String, rule_id: String },
    /// Bound parameters do not satisfy the rule's input schema.
    InvalidParams { reason: String },
    /// The rule ran and reported failure.
    Invocation { message: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBot { bot } => write!(f, "unknown bot: {bot}"),
            Self::UnknownRule { bot, rule_id } => {
                write!(f, "unknown rule: {bot}@{rule_id}")
            }
            Self::InvalidParams { reason } => write!(f, "invalid parameters: {reason}"),
            Self::Invocation { message } => write!(f, "rule invocation failed: {message}"),
        }
    }
}

impl std::error::Error for RuleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_error_display() {
        let err = RuleError::UnknownRule {
            bot: "dev".to_string(),
            rule_id: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "unknown rule: dev@missing");
    }

    #[test]
    fn invalid_params_display() {
        let err = RuleError::InvalidParams {
            reason: "missing required parameter 'url'".to_string(),
        };
        assert!(err.to_string().contains("url"));
    }
}
