//! Output JSON schemas the LLM response must conform to.

use serde_json::{json, Value};
use valuation_core::Tier;

fn recommendation_item() -> Value {
    json!({
        "type": "object",
        "required": ["action", "priority"],
        "properties": {
            "action": { "type": "string" },
            "priority": { "type": "string", "enum": ["high", "medium", "low"] },
            "timeline": { "type": "string" },
            "expected_impact": { "type": "string" }
        }
    })
}

fn risk_item() -> Value {
    json!({
        "type": "object",
        "required": ["risk", "severity"],
        "properties": {
            "risk": { "type": "string" },
            "severity": { "type": "string", "enum": ["high", "medium", "low"] },
            "mitigation": { "type": "string" }
        }
    })
}

fn valuation_object() -> Value {
    json!({
        "type": "object",
        "required": ["low", "high"],
        "properties": {
            "low": { "type": "number" },
            "mid": { "type": "number" },
            "high": { "type": "number" },
            "methodology": { "type": "string" }
        }
    })
}

pub fn professional_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "ProfessionalAnalysis",
        "type": "object",
        "required": [
            "executive_summary",
            "valuation",
            "financial_health",
            "key_findings",
            "recommendations",
            "risks",
            "confidence"
        ],
        "properties": {
            "executive_summary": { "type": "string" },
            "valuation": valuation_object(),
            "financial_health": {
                "type": "object",
                "properties": {
                    "score": { "type": "number", "minimum": 0, "maximum": 100 },
                    "assessment": { "type": "string" }
                }
            },
            "key_findings": { "type": "array", "items": { "type": "string" } },
            "recommendations": { "type": "array", "items": recommendation_item() },
            "risks": { "type": "array", "items": risk_item() },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
        }
    })
}

/// Professional schema plus scenario, strategic and capital structure sections.
pub fn enterprise_schema() -> Value {
    let mut schema = professional_schema();
    schema["title"] = json!("EnterpriseAnalysis");
    if let Some(required) = schema["required"].as_array_mut() {
        required.push(json!("scenario_analysis"));
        required.push(json!("strategic_options"));
    }
    if let Some(properties) = schema["properties"].as_object_mut() {
        properties.insert(
            "scenario_analysis".to_string(),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["scenario", "probability"],
                    "properties": {
                        "scenario": { "type": "string" },
                        "probability": { "type": "number", "minimum": 0, "maximum": 1 },
                        "valuation": valuation_object()
                    }
                }
            }),
        );
        properties.insert(
            "strategic_options".to_string(),
            json!({ "type": "array", "items": { "type": "string" } }),
        );
        properties.insert(
            "capital_structure_assessment".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "optimal_debt_to_equity": { "type": "number" },
                    "commentary": { "type": "string" }
                }
            }),
        );
    }
    schema
}

/// Top-level `required` keys of a schema.
pub fn required_fields(schema: &Value) -> Vec<String> {
    schema["required"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

pub fn schema_for(tier: Tier) -> Option<Value> {
    match tier {
        Tier::Consumer => None,
        Tier::Professional => Some(professional_schema()),
        Tier::Enterprise => Some(enterprise_schema()),
    }
}
