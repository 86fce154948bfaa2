//! Quality Scoring Module
//!
//! Grades a produced analysis along five weighted dimensions. Each dimension is
//! a list of pass/fail criteria; its score is the share of criteria passed.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use valuation_core::stats::round_to;
use valuation_core::Tier;

use crate::output::tier_required_fields;

pub const REQUIRED_FIELD_THRESHOLD: f64 = 0.8;
pub const RELEVANCE_THRESHOLD: f64 = 0.3;
pub const ACTIONABLE_THRESHOLD: f64 = 0.5;
pub const MIN_RISKS: usize = 2;
/// Prompt terms considered when judging relevance
pub const KEY_TERM_LIMIT: usize = 20;
const MIN_TERM_LEN: usize = 5;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "being", "below", "between", "could", "during",
    "every", "first", "their", "there", "these", "those", "through", "under", "until", "where",
    "which", "while", "would", "should", "other", "provide", "include", "using", "string", "number",
    "object", "array", "required", "properties", "within", "based",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCriterion {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDimension {
    pub name: String,
    pub weight: f64,
    /// Share of criteria passed, 0-1
    pub score: f64,
    pub description: String,
    pub criteria: Vec<QualityCriterion>,
}

impl QualityDimension {
    fn new(name: &str, weight: f64, description: &str, criteria: Vec<QualityCriterion>) -> Self {
        let passed = criteria.iter().filter(|c| c.passed).count();
        let score = if criteria.is_empty() {
            0.0
        } else {
            passed as f64 / criteria.len() as f64
        };
        Self {
            name: name.to_string(),
            weight,
            score,
            description: description.to_string(),
            criteria,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScoring {
    /// Weighted sum of dimension scores, 0-1
    pub overall: f64,
    pub dimensions: Vec<QualityDimension>,
}

impl QualityScoring {
    pub fn dimension(&self, name: &str) -> Option<&QualityDimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn failed_criteria(&self) -> Vec<&QualityCriterion> {
        self.dimensions
            .iter()
            .flat_map(|d| d.criteria.iter())
            .filter(|c| !c.passed)
            .collect()
    }
}

fn criterion(name: &str, passed: bool, detail: String) -> QualityCriterion {
    QualityCriterion {
        name: name.to_string(),
        passed,
        detail,
    }
}

/// Grade an analysis against the prompt that produced it.
pub fn calculate_quality_score(analysis: &Value, prompt: &str, tier: Tier) -> QualityScoring {
    let dimensions = vec![
        QualityDimension::new(
            "completeness",
            0.3,
            "Required output sections are present",
            completeness_criteria(analysis, tier),
        ),
        QualityDimension::new(
            "accuracy",
            0.25,
            "Figures are internally consistent",
            accuracy_criteria(analysis),
        ),
        QualityDimension::new(
            "relevance",
            0.2,
            "Analysis addresses the terms of the prompt",
            relevance_criteria(analysis, prompt),
        ),
        QualityDimension::new(
            "depth",
            0.15,
            "Enough recommendations and risks for the tier",
            depth_criteria(analysis, tier),
        ),
        QualityDimension::new(
            "actionability",
            0.1,
            "Recommendations can be scheduled and ranked",
            actionability_criteria(analysis),
        ),
    ];

    let overall = dimensions.iter().map(|d| d.weight * d.score).sum::<f64>();
    debug!(overall = overall, tier = tier.as_str(), "Quality scored");

    QualityScoring {
        overall: round_to(overall.clamp(0.0, 1.0), 4),
        dimensions,
    }
}

fn completeness_criteria(analysis: &Value, tier: Tier) -> Vec<QualityCriterion> {
    let required = tier_required_fields(tier);
    let present = required
        .iter()
        .filter(|field| analysis.get(field.as_str()).is_some_and(|v| !v.is_null()))
        .count();
    let ratio = if required.is_empty() {
        1.0
    } else {
        present as f64 / required.len() as f64
    };

    let summary_len = analysis
        .get("executive_summary")
        .and_then(Value::as_str)
        .map(|s| s.trim().len())
        .unwrap_or(0);

    vec![
        criterion(
            "required_fields_present",
            ratio >= REQUIRED_FIELD_THRESHOLD,
            format!("{} of {} required fields present", present, required.len()),
        ),
        criterion(
            "executive_summary_written",
            summary_len > 0,
            format!("executive summary has {} characters", summary_len),
        ),
    ]
}

fn accuracy_criteria(analysis: &Value) -> Vec<QualityCriterion> {
    let confidence = analysis.get("confidence").and_then(Value::as_f64);
    let confidence_ok = confidence.is_some_and(|c| (0.0..=1.0).contains(&c));

    let valuation = analysis.get("valuation");
    let low = valuation.and_then(|v| v.get("low")).and_then(Value::as_f64);
    let high = valuation.and_then(|v| v.get("high")).and_then(Value::as_f64);
    let range_ok = matches!((low, high), (Some(l), Some(h)) if l <= h);

    let mut numbers = Vec::new();
    collect_numbers(analysis, &mut numbers);
    let finite_ok = numbers.iter().all(|n| n.is_finite());

    vec![
        criterion(
            "confidence_in_range",
            confidence_ok,
            match confidence {
                Some(c) => format!("confidence {}", c),
                None => "confidence missing".to_string(),
            },
        ),
        criterion(
            "valuation_range_ordered",
            range_ok,
            format!("valuation low {:?}, high {:?}", low, high),
        ),
        criterion(
            "numbers_finite",
            finite_ok,
            format!("{} numeric values checked", numbers.len()),
        ),
    ]
}

fn collect_numbers(value: &Value, out: &mut Vec<f64>) {
    match value {
        Value::Number(n) => out.push(n.as_f64().unwrap_or(f64::NAN)),
        Value::Array(items) => items.iter().for_each(|v| collect_numbers(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_numbers(v, out)),
        _ => {}
    }
}

fn relevance_criteria(analysis: &Value, prompt: &str) -> Vec<QualityCriterion> {
    let terms = key_terms(prompt, KEY_TERM_LIMIT);
    let text = analysis_text(analysis).to_lowercase();
    let matched = terms.iter().filter(|t| text.contains(t.as_str())).count();
    let coverage = if terms.is_empty() {
        1.0
    } else {
        matched as f64 / terms.len() as f64
    };

    vec![criterion(
        "prompt_terms_addressed",
        coverage >= RELEVANCE_THRESHOLD,
        format!("{} of {} key prompt terms referenced", matched, terms.len()),
    )]
}

/// Most frequent substantive words of the prompt, ties broken alphabetically.
pub fn key_terms(prompt: &str, limit: usize) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in prompt
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.len() >= MIN_TERM_LEN)
    {
        let word = word.to_lowercase();
        if !stop.contains(word.as_str()) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

/// String values of the analysis. Keys are schema names and are left out.
fn analysis_text(value: &Value) -> String {
    let mut out = String::new();
    append_text(value, &mut out);
    out
}

fn append_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(s);
            out.push(' ');
        }
        Value::Array(items) => items.iter().for_each(|v| append_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| append_text(v, out)),
        _ => {}
    }
}

fn min_recommendations(tier: Tier) -> usize {
    match tier {
        Tier::Enterprise => 5,
        _ => 3,
    }
}

fn array_len(analysis: &Value, field: &str) -> usize {
    analysis
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

fn depth_criteria(analysis: &Value, tier: Tier) -> Vec<QualityCriterion> {
    let recommendations = array_len(analysis, "recommendations");
    let risks = array_len(analysis, "risks");
    let wanted = min_recommendations(tier);

    vec![
        criterion(
            "recommendation_count",
            recommendations >= wanted,
            format!("{} recommendations, {} expected", recommendations, wanted),
        ),
        criterion(
            "risk_count",
            risks >= MIN_RISKS,
            format!("{} risks, {} expected", risks, MIN_RISKS),
        ),
    ]
}

fn actionability_criteria(analysis: &Value) -> Vec<QualityCriterion> {
    let recommendations = analysis
        .get("recommendations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let actionable = recommendations
        .iter()
        .filter(|r| {
            ["priority", "timeline"]
                .iter()
                .any(|k| r.get(*k).is_some_and(|v| !v.is_null()))
        })
        .count();
    let share = if recommendations.is_empty() {
        0.0
    } else {
        actionable as f64 / recommendations.len() as f64
    };

    vec![criterion(
        "recommendations_prioritized",
        share >= ACTIONABLE_THRESHOLD,
        format!(
            "{} of {} recommendations carry a priority or timeline",
            actionable,
            recommendations.len()
        ),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_terms_rank_by_frequency() {
        let prompt = "Revenue growth drives valuation. Revenue margins and revenue quality. Growth matters.";
        let terms = key_terms(prompt, 3);
        assert_eq!(terms, vec!["revenue", "growth", "drives"]);
    }

    #[test]
    fn test_key_terms_skip_short_and_stop_words() {
        let terms = key_terms("the cash about which would EBITDA", 10);
        assert_eq!(terms, vec!["ebitda"]);
    }

    #[test]
    fn test_actionability_with_string_recommendations() {
        let analysis = json!({ "recommendations": ["Cut costs", "Raise prices"] });
        let criteria = actionability_criteria(&analysis);
        assert!(!criteria[0].passed);

        let analysis = json!({ "recommendations": [
            { "action": "Cut costs", "timeline": "Q3" },
            "Raise prices"
        ]});
        assert!(actionability_criteria(&analysis)[0].passed);
    }

    #[test]
    fn test_depth_thresholds_by_tier() {
        let analysis = json!({
            "recommendations": [1, 2, 3],
            "risks": ["a", "b"]
        });
        assert!(depth_criteria(&analysis, Tier::Professional).iter().all(|c| c.passed));
        let enterprise = depth_criteria(&analysis, Tier::Enterprise);
        assert!(!enterprise[0].passed);
        assert!(enterprise[1].passed);
    }

    #[test]
    fn test_relevance_ignores_object_keys() {
        let prompt = "Executive summary of the valuation. Executive summary and valuation drivers.";
        let keys_only = json!({ "executive_summary": "", "valuation": { "low": 1.0 } });
        let criteria = relevance_criteria(&keys_only, prompt);
        assert!(!criteria[0].passed, "{}", criteria[0].detail);

        let addressed = json!({ "executive_summary": "The valuation rests on recurring revenue drivers." });
        assert!(relevance_criteria(&addressed, prompt)[0].passed);
    }

    #[test]
    fn test_dimension_score_is_share_passed() {
        let dim = QualityDimension::new(
            "accuracy",
            0.25,
            "",
            vec![
                criterion("a", true, String::new()),
                criterion("b", false, String::new()),
                criterion("c", true, String::new()),
                criterion("d", true, String::new()),
            ],
        );
        assert!((dim.score - 0.75).abs() < 1e-9);
    }
}
