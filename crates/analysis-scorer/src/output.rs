//! Validation of raw LLM completions against the tier's output schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use valuation_core::Tier;

use prompt_templates::{professional_schema, required_fields, schema_for};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// Parsed body, present whenever the completion held a JSON object
    pub value: Option<Value>,
}

/// Required top-level fields for a tier. Consumer output is held to the
/// professional schema.
pub fn tier_required_fields(tier: Tier) -> Vec<String> {
    let schema = schema_for(tier).unwrap_or_else(professional_schema);
    required_fields(&schema)
}

/// Parse a completion and check it against the tier's schema. Never fails;
/// problems are reported in `errors`.
pub fn validate_analysis_output(raw: &str, tier: Tier) -> OutputValidation {
    let mut errors = Vec::new();

    let value = match parse_json_body(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => {
            errors.push(format!("Expected a JSON object, found {}", json_kind(&other)));
            return finish(errors, None, tier);
        }
        Err(e) => {
            errors.push(format!("Invalid JSON: {}", e));
            return finish(errors, None, tier);
        }
    };

    for field in tier_required_fields(tier) {
        if value.get(&field).map_or(true, Value::is_null) {
            errors.push(format!("Missing required field: {}", field));
        }
    }

    if let Some(confidence) = value.get("confidence") {
        match confidence.as_f64() {
            Some(c) if (0.0..=1.0).contains(&c) => {}
            Some(c) => errors.push(format!("confidence must be between 0 and 1, got {}", c)),
            None if !confidence.is_null() => errors.push("confidence must be a number".to_string()),
            None => {}
        }
    }

    if let Some(valuation) = value.get("valuation") {
        let low = valuation.get("low").and_then(Value::as_f64);
        let high = valuation.get("high").and_then(Value::as_f64);
        if let (Some(l), Some(h)) = (low, high) {
            if l > h {
                errors.push(format!("valuation low ({}) exceeds high ({})", l, h));
            }
        }
    }

    finish(errors, Some(value), tier)
}

fn finish(errors: Vec<String>, value: Option<Value>, tier: Tier) -> OutputValidation {
    if !errors.is_empty() {
        warn!(tier = tier.as_str(), errors = errors.len(), "Analysis output failed validation");
    }
    OutputValidation {
        is_valid: errors.is_empty(),
        errors,
        value,
    }
}

/// Models often wrap JSON in markdown fences or prose; fall back to the
/// outermost brace span when the trimmed text does not parse.
fn parse_json_body(raw: &str) -> Result<Value, serde_json::Error> {
    let trimmed = strip_code_fence(raw.trim());
    match serde_json::from_str(trimmed) {
        Ok(v) => Ok(v),
        Err(e) => match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end]),
            _ => Err(e),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("{}"), "{}");
    }

    #[test]
    fn test_prose_around_json_is_tolerated() {
        let parsed = parse_json_body("Here is the analysis:\n{\"confidence\": 0.7}\nThanks").unwrap();
        assert_eq!(parsed["confidence"], 0.7);
    }

    #[test]
    fn test_non_object_is_rejected() {
        let result = validate_analysis_output("[1, 2]", Tier::Professional);
        assert!(!result.is_valid);
        assert!(result.value.is_none());
        assert!(result.errors[0].contains("array"));
    }

    #[test]
    fn test_garbage_reports_invalid_json() {
        let result = validate_analysis_output("not json at all", Tier::Enterprise);
        assert!(!result.is_valid);
        assert!(result.errors[0].starts_with("Invalid JSON"));
    }

    #[test]
    fn test_consumer_uses_professional_fields() {
        assert_eq!(
            tier_required_fields(Tier::Consumer),
            tier_required_fields(Tier::Professional)
        );
        assert_eq!(tier_required_fields(Tier::Enterprise).len(), 9);
    }
}
