//! Parameter binding and `{{name}}` placeholder substitution.
//!
//! Node parameters are open JSON values. Before a rule is invoked, the
//! executor substitutes placeholders from the scope assembled out of
//! predecessor step outputs:
//!
//! - a string that is exactly one placeholder binds the raw JSON value
//!   (`"{{x}}"` with `x = 1` becomes the number `1`)
//! - placeholders embedded in longer strings interpolate their text form
//! - names missing from the scope resolve to the empty string, never an
//!   error

use serde_json::{Map as JsonMap, Value as JsonValue};

/// Substitutes placeholders in an entire parameter map.
#[must_use]
pub fn bind_parameters(
    parameters: &JsonMap<String, JsonValue>,
    scope: &JsonMap<String, JsonValue>,
) -> JsonMap<String, JsonValue> {
    parameters
        .iter()
        .map(|(key, value)| (key.clone(), substitute(value, scope)))
        .collect()
}

/// Substitutes placeholders in a single JSON value, recursing into
/// objects and arrays.
#[must_use]
pub fn substitute(value: &JsonValue, scope: &JsonMap<String, JsonValue>) -> JsonValue {
    match value {
        JsonValue::String(s) => substitute_string(s, scope),
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|item| substitute(item, scope)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), substitute(item, scope)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_string(s: &str, scope: &JsonMap<String, JsonValue>) -> JsonValue {
    // Whole-string placeholder binds the raw value, preserving its type.
    if let Some(name) = sole_placeholder(s) {
        return scope
            .get(name)
            .cloned()
            .unwrap_or_else(|| JsonValue::String(String::new()));
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        result.push_str(&rest[..start]);
        let name = after[..end].trim();
        result.push_str(&render(scope.get(name)));
        rest = &after[end + 2..];
    }
    result.push_str(rest);
    JsonValue::String(result)
}

/// Returns the placeholder name if the string consists of exactly one
/// placeholder and nothing else.
fn sole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn render(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> JsonMap<String, JsonValue> {
        let JsonValue::Object(map) = json!({
            "x": 1,
            "name": "alice",
            "flag": true,
            "payload": {"deep": [1, 2]}
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn whole_string_placeholder_binds_raw_value() {
        let bound = substitute(&json!("{{x}}"), &scope());
        assert_eq!(bound, json!(1));
    }

    #[test]
    fn whole_string_placeholder_binds_objects() {
        let bound = substitute(&json!("{{payload}}"), &scope());
        assert_eq!(bound, json!({"deep": [1, 2]}));
    }

    #[test]
    fn embedded_placeholder_interpolates() {
        let bound = substitute(&json!("hello {{name}}, x={{x}}"), &scope());
        assert_eq!(bound, json!("hello alice, x=1"));
    }

    #[test]
    fn unknown_placeholder_resolves_to_empty_string() {
        assert_eq!(substitute(&json!("{{missing}}"), &scope()), json!(""));
        assert_eq!(
            substitute(&json!("a {{missing}} b"), &scope()),
            json!("a  b")
        );
    }

    #[test]
    fn non_string_values_pass_through() {
        assert_eq!(substitute(&json!(42), &scope()), json!(42));
        assert_eq!(substitute(&json!(null), &scope()), json!(null));
        assert_eq!(substitute(&json!(true), &scope()), json!(true));
    }

    #[test]
    fn substitution_recurses_into_collections() {
        let value = json!({
            "greeting": "hi {{name}}",
            "values": ["{{x}}", "{{flag}}"],
            "nested": {"inner": "{{x}}"}
        });
        let bound = substitute(&value, &scope());
        assert_eq!(
            bound,
            json!({
                "greeting": "hi alice",
                "values": [1, true],
                "nested": {"inner": 1}
            })
        );
    }

    #[test]
    fn placeholder_names_are_trimmed() {
        assert_eq!(substitute(&json!("{{ x }}"), &scope()), json!(1));
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(
            substitute(&json!("stray {{x"), &scope()),
            json!("stray {{x")
        );
    }

    #[test]
    fn bind_parameters_substitutes_every_entry() {
        let JsonValue::Object(params) = json!({"a": "{{x}}", "b": "plain"}) else {
            unreachable!()
        };
        let bound = bind_parameters(&params, &scope());
        assert_eq!(bound["a"], json!(1));
        assert_eq!(bound["b"], json!("plain"));
    }
}
