//! Confidence Scoring Module
//!
//! Blends data, model and history signals into a single confidence figure for a
//! produced analysis, then applies a conservative calibration with fixed
//! interval bands.

use analysis_context::AnalysisContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use valuation_core::stats::{clamp_score, mean, round_to};

pub const DATA_QUALITY_WEIGHT: f64 = 0.25;
pub const MODEL_RELIABILITY_WEIGHT: f64 = 0.2;
pub const CONTEXT_COMPLETENESS_WEIGHT: f64 = 0.2;
pub const HISTORICAL_ACCURACY_WEIGHT: f64 = 0.2;
pub const EXPERT_VALIDATION_WEIGHT: f64 = 0.15;

/// Placeholder until provider-level reliability tracking exists
pub const MODEL_RELIABILITY: f64 = 0.8;
/// Placeholder until analyst review feeds back into scoring
pub const EXPERT_VALIDATION: f64 = 0.7;
pub const DEFAULT_HISTORICAL_ACCURACY: f64 = 0.5;

/// Conservative shrink applied to the raw score
pub const CALIBRATION_MULTIPLIER: f64 = 0.9;

/// Outcome of an earlier decision made on a prior analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    /// 0-1, how well the decision turned out
    pub success_score: f64,
}

/// Call metadata recorded alongside a completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub model: String,
    pub version: Option<String>,
    pub latency_ms: u64,
    pub generated_at: Option<DateTime<Utc>>,
    pub decision_outcomes: Vec<DecisionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFactor {
    pub name: String,
    pub weight: f64,
    /// 0-1
    pub score: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Nominal coverage, e.g. 0.68
    pub coverage: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub multiplier: f64,
    pub calibrated: f64,
    pub intervals: Vec<ConfidenceInterval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScoring {
    /// Weighted sum of factor scores, 0-1
    pub overall: f64,
    pub factors: Vec<ScoringFactor>,
    pub calibration: Calibration,
    pub model: String,
    pub scored_at: DateTime<Utc>,
}

impl ConfidenceScoring {
    pub fn factor(&self, name: &str) -> Option<&ScoringFactor> {
        self.factors.iter().find(|f| f.name == name)
    }
}

/// Score how far a produced analysis can be trusted.
///
/// The analysis body itself does not move the score; it is accepted so callers
/// can pass the full completion through one entry point.
pub fn calculate_confidence_score(
    analysis: &Value,
    context: &AnalysisContext,
    metadata: &AnalysisMetadata,
) -> ConfidenceScoring {
    let factors = vec![
        ScoringFactor {
            name: "data_quality".to_string(),
            weight: DATA_QUALITY_WEIGHT,
            score: data_quality_factor(context),
            description: "Depth of the supplied business data".to_string(),
        },
        ScoringFactor {
            name: "model_reliability".to_string(),
            weight: MODEL_RELIABILITY_WEIGHT,
            score: MODEL_RELIABILITY,
            description: format!("Baseline reliability of {}", model_label(metadata)),
        },
        ScoringFactor {
            name: "context_completeness".to_string(),
            weight: CONTEXT_COMPLETENESS_WEIGHT,
            score: context_completeness_factor(context),
            description: "Optional context sections available to the model".to_string(),
        },
        ScoringFactor {
            name: "historical_accuracy".to_string(),
            weight: HISTORICAL_ACCURACY_WEIGHT,
            score: historical_accuracy_factor(&metadata.decision_outcomes),
            description: format!(
                "Mean success of {} prior decision outcomes",
                metadata.decision_outcomes.len()
            ),
        },
        ScoringFactor {
            name: "expert_validation".to_string(),
            weight: EXPERT_VALIDATION_WEIGHT,
            score: EXPERT_VALIDATION,
            description: "Expert review baseline".to_string(),
        },
    ];

    let overall = clamp_score(
        factors.iter().map(|f| f.weight * f.score).sum::<f64>(),
        0.0,
        1.0,
    );
    let calibration = calibrate(overall);

    debug!(
        overall = overall,
        calibrated = calibration.calibrated,
        has_summary = analysis.get("executive_summary").is_some(),
        "Confidence scored"
    );

    ConfidenceScoring {
        overall: round_to(overall, 4),
        factors,
        calibration,
        model: metadata.model.clone(),
        scored_at: Utc::now(),
    }
}

/// 0.3 base, +0.2 for revenue history and valuation ranges, +0.15 for
/// customer count and market size.
fn data_quality_factor(context: &AnalysisContext) -> f64 {
    let financial = &context.financial_metrics;
    let mut score: f64 = 0.3;
    if financial.performance.revenue.historical.len() >= 2 {
        score += 0.2;
    }
    if financial.valuation.is_some() {
        score += 0.2;
    }
    if context.operational_metrics.customer.count.is_some() {
        score += 0.15;
    }
    if context.market_context.market_size.is_some() {
        score += 0.15;
    }
    score.min(1.0)
}

fn context_completeness_factor(context: &AnalysisContext) -> f64 {
    let present = [
        context.financial_metrics.projections.is_some(),
        context.financial_metrics.performance.leverage.capital_structure.is_some(),
        context.strategic_context.value_drivers.is_some(),
        context.focus.is_some(),
    ]
    .into_iter()
    .filter(|p| *p)
    .count();
    (0.5 + 0.15 * present as f64).min(1.0)
}

fn historical_accuracy_factor(outcomes: &[DecisionOutcome]) -> f64 {
    if outcomes.is_empty() {
        return DEFAULT_HISTORICAL_ACCURACY;
    }
    let scores: Vec<f64> = outcomes
        .iter()
        .map(|o| clamp_score(o.success_score, 0.0, 1.0))
        .collect();
    mean(&scores)
}

fn calibrate(raw: f64) -> Calibration {
    let calibrated = clamp_score(raw * CALIBRATION_MULTIPLIER, 0.0, 1.0);
    let band = |coverage: f64, width: f64| ConfidenceInterval {
        coverage,
        lower: round_to((calibrated - width).max(0.0), 4),
        upper: round_to((calibrated + width).min(1.0), 4),
    };

    Calibration {
        multiplier: CALIBRATION_MULTIPLIER,
        calibrated: round_to(calibrated, 4),
        intervals: vec![band(0.68, 0.1), band(0.95, 0.2)],
    }
}

fn model_label(metadata: &AnalysisMetadata) -> String {
    match (&metadata.model, &metadata.version) {
        (m, _) if m.is_empty() => "the configured model".to_string(),
        (m, Some(v)) => format!("{} ({})", m, v),
        (m, None) => m.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_historical_accuracy_defaults_without_outcomes() {
        assert_eq!(historical_accuracy_factor(&[]), 0.5);
        let outcomes = vec![
            DecisionOutcome { success_score: 0.9 },
            DecisionOutcome { success_score: 0.7 },
        ];
        assert!((historical_accuracy_factor(&outcomes) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_outcomes_are_clamped() {
        let outcomes = vec![
            DecisionOutcome { success_score: 3.0 },
            DecisionOutcome { success_score: -1.0 },
        ];
        assert!((historical_accuracy_factor(&outcomes) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_bands() {
        let calibration = calibrate(0.8);
        assert!((calibration.calibrated - 0.72).abs() < 1e-9);
        assert_eq!(calibration.intervals.len(), 2);

        let narrow = &calibration.intervals[0];
        assert_eq!(narrow.coverage, 0.68);
        assert!((narrow.lower - 0.62).abs() < 1e-9);
        assert!((narrow.upper - 0.82).abs() < 1e-9);

        let wide = &calibration.intervals[1];
        assert!((wide.lower - 0.52).abs() < 1e-9);
        assert!((wide.upper - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_bands_stay_in_unit_range() {
        let low = calibrate(0.05);
        assert!(low.intervals.iter().all(|i| i.lower >= 0.0));
        let high = calibrate(1.0);
        assert!(high.intervals.iter().all(|i| i.upper <= 1.0));
    }

    #[test]
    fn test_model_label() {
        let mut metadata = AnalysisMetadata::default();
        assert_eq!(model_label(&metadata), "the configured model");
        metadata.model = "gpt-4".to_string();
        metadata.version = Some("0613".to_string());
        assert_eq!(model_label(&metadata), "gpt-4 (0613)");
    }
}
