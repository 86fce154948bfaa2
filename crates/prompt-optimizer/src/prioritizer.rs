use serde::{Deserialize, Serialize};
use valuation_core::stats::clamp_score;
use valuation_core::{AnalysisType, BusinessStage, PriorityLevel, RiskTolerance, Tier, Urgency};

const PROMPT_TYPE_WEIGHT: f64 = 0.3;
const TIER_WEIGHT: f64 = 0.2;
const BUSINESS_CONTEXT_WEIGHT: f64 = 0.25;
const URGENCY_WEIGHT: f64 = 0.25;

/// The parts of a business context that influence prompt priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContextHints {
    pub annual_revenue: Option<f64>,
    pub stage: Option<BusinessStage>,
    pub risk_tolerance: Option<RiskTolerance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityFactor {
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPriority {
    pub level: PriorityLevel,
    /// 0-1
    pub score: f64,
    pub factors: Vec<PriorityFactor>,
    pub reasoning: String,
}

pub fn prompt_type_score(prompt_type: AnalysisType) -> f64 {
    match prompt_type {
        AnalysisType::Comprehensive => 0.7,
        AnalysisType::Valuation => 0.9,
        AnalysisType::FinancialAnalysis => 0.85,
        AnalysisType::RiskAssessment => 0.8,
        AnalysisType::StrategicPlanning => 0.75,
        AnalysisType::MarketAnalysis => 0.65,
        AnalysisType::OperationalAnalysis => 0.6,
        AnalysisType::CompetitiveAnalysis => 0.6,
    }
}

/// 0.5 base plus revenue, stage and risk-tolerance bonuses, capped at 1.
pub fn business_context_score(hints: &BusinessContextHints) -> f64 {
    let mut score = 0.5;

    score += match hints.annual_revenue {
        Some(r) if r >= 100_000_000.0 => 0.3,
        Some(r) if r >= 10_000_000.0 => 0.2,
        Some(r) if r >= 1_000_000.0 => 0.1,
        _ => 0.0,
    };
    score += match hints.stage {
        Some(BusinessStage::Transition) => 0.3,
        Some(BusinessStage::Growth) => 0.2,
        Some(BusinessStage::Startup) => 0.15,
        Some(BusinessStage::Mature) => 0.1,
        None => 0.0,
    };
    score += match hints.risk_tolerance {
        Some(RiskTolerance::Conservative) => 0.1,
        Some(RiskTolerance::Moderate) => 0.05,
        _ => 0.0,
    };

    clamp_score(score, 0.0, 1.0)
}

fn factor(name: &str, weight: f64, score: f64) -> PriorityFactor {
    PriorityFactor {
        name: name.to_string(),
        weight,
        score,
        contribution: weight * score,
    }
}

pub fn calculate_priority(
    prompt_type: AnalysisType,
    tier: Tier,
    hints: &BusinessContextHints,
    urgency: Urgency,
) -> PromptPriority {
    let factors = vec![
        factor("prompt_type", PROMPT_TYPE_WEIGHT, prompt_type_score(prompt_type)),
        factor("tier", TIER_WEIGHT, tier.multiplier()),
        factor("business_context", BUSINESS_CONTEXT_WEIGHT, business_context_score(hints)),
        factor("urgency", URGENCY_WEIGHT, urgency.score()),
    ];
    let score = clamp_score(factors.iter().map(|f| f.contribution).sum(), 0.0, 1.0);
    let level = PriorityLevel::from_score(score);

    let top = factors
        .iter()
        .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
        .map(|f| f.name.as_str())
        .unwrap_or("prompt_type");
    let reasoning = format!(
        "{:?} priority (score {:.2}) driven mainly by {} for {} analysis",
        level,
        score,
        top,
        prompt_type.as_str()
    );

    PromptPriority {
        level,
        score,
        factors,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_is_monotonic() {
        let hints = BusinessContextHints::default();
        for t in AnalysisType::all() {
            let low = calculate_priority(t, Tier::Professional, &hints, Urgency::Low);
            let critical = calculate_priority(t, Tier::Professional, &hints, Urgency::Critical);
            assert!(critical.score >= low.score);
        }
    }

    #[test]
    fn test_enterprise_at_least_professional() {
        let hints = BusinessContextHints {
            annual_revenue: Some(25_000_000.0),
            stage: Some(BusinessStage::Growth),
            risk_tolerance: Some(RiskTolerance::Moderate),
        };
        let pro = calculate_priority(AnalysisType::Valuation, Tier::Professional, &hints, Urgency::Medium);
        let ent = calculate_priority(AnalysisType::Valuation, Tier::Enterprise, &hints, Urgency::Medium);
        assert!(ent.score >= pro.score);
    }

    #[test]
    fn test_business_context_caps_at_one() {
        let hints = BusinessContextHints {
            annual_revenue: Some(500_000_000.0),
            stage: Some(BusinessStage::Transition),
            risk_tolerance: Some(RiskTolerance::Conservative),
        };
        assert_eq!(business_context_score(&hints), 1.0);
        assert_eq!(business_context_score(&BusinessContextHints::default()), 0.5);
    }

    #[test]
    fn test_score_and_level() {
        let priority = calculate_priority(
            AnalysisType::Valuation,
            Tier::Enterprise,
            &BusinessContextHints::default(),
            Urgency::Critical,
        );
        // 0.27 + 0.2 + 0.125 + 0.25
        assert!((priority.score - 0.845).abs() < 1e-9);
        assert_eq!(priority.level, PriorityLevel::Critical);
        assert_eq!(priority.factors.len(), 4);
        assert!(priority.reasoning.contains("prompt_type"));
    }
}
