//! Structural conformance of step inputs against a tool's declared JSON
//! Schema. This runs before any domain-specific rule and is independent of
//! tool semantics.

use jsonschema::JSONSchema;
use serde_json::Value;

/// Validates `input` against `schema`, returning every mismatch as a
/// human-readable message. An absent or empty schema imposes no
/// constraints. A schema that does not compile is reported as a single
/// error rather than silently waved through.
pub fn conformance_errors(schema: &Value, input: &Value) -> Vec<String> {
    let Some(schema_object) = schema.as_object() else {
        return Vec::new();
    };
    if schema_object.is_empty() {
        return Vec::new();
    }

    let compiled = match JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(error) => return vec![format!("tool schema does not compile: {error}")],
    };

    // The error iterator borrows `compiled`; collect before it drops.
    let messages = match compiled.validate(input) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|error| error.to_string()).collect(),
    };
    messages
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::conformance_errors;

    fn slack_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "channel": {"type": "string"},
                "text": {"type": "string"},
            },
            "required": ["channel", "text"],
            "additionalProperties": false,
        })
    }

    #[test]
    fn conforming_input_produces_no_errors() {
        let errors =
            conformance_errors(&slack_schema(), &json!({"channel": "#general", "text": "hi"}));
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn missing_required_property_is_reported() {
        let errors = conformance_errors(&slack_schema(), &json!({"channel": "#general"}));
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|error| error.contains("text")), "{errors:?}");
    }

    #[test]
    fn additional_properties_are_rejected_when_schema_says_so() {
        let errors = conformance_errors(
            &slack_schema(),
            &json!({"channel": "#general", "text": "hi", "extra": 1}),
        );
        assert!(!errors.is_empty());
    }

    #[test]
    fn empty_schema_imposes_no_constraints() {
        assert!(conformance_errors(&json!({}), &json!({"anything": true})).is_empty());
        assert!(conformance_errors(&serde_json::Value::Null, &json!({})).is_empty());
    }

    #[test]
    fn type_mismatches_are_all_collected() {
        let errors = conformance_errors(
            &slack_schema(),
            &json!({"channel": 42, "text": ["not", "a", "string"]}),
        );
        assert!(errors.len() >= 2, "{errors:?}");
    }
}
