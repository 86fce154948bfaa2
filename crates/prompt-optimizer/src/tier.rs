//! Declarative per-tier feature sets, limits and enhanced capabilities.

use serde::{Deserialize, Serialize};
use valuation_core::Tier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeature {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub token_allocation: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitationKind {
    Token,
    Complexity,
    Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierLimitation {
    pub kind: LimitationKind,
    pub threshold: f64,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedCapability {
    pub name: String,
    pub description: String,
    pub token_cost: usize,
    pub quality_boost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    pub tier: Tier,
    pub features: Vec<TierFeature>,
    pub limitations: Vec<TierLimitation>,
    pub capabilities: Vec<EnhancedCapability>,
}

impl TierProfile {
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }

    /// Combined quality multiplier of all enhanced capabilities.
    pub fn quality_boost(&self) -> f64 {
        self.capabilities.iter().map(|c| c.quality_boost).product()
    }
}

fn feature(name: &str, description: &str, available: bool, token_allocation: usize) -> TierFeature {
    TierFeature {
        name: name.to_string(),
        description: description.to_string(),
        available,
        token_allocation,
    }
}

fn limitation(kind: LimitationKind, threshold: f64, fallback: &str) -> TierLimitation {
    TierLimitation {
        kind,
        threshold,
        fallback: fallback.to_string(),
    }
}

fn capability(name: &str, description: &str, token_cost: usize, quality_boost: f64) -> EnhancedCapability {
    EnhancedCapability {
        name: name.to_string(),
        description: description.to_string(),
        token_cost,
        quality_boost,
    }
}

pub fn tier_profile(tier: Tier) -> TierProfile {
    let professional_plus = tier >= Tier::Professional;
    let enterprise = tier == Tier::Enterprise;

    let features = vec![
        feature("basic_analysis", "Summary analysis of core business data", true, 500),
        feature("financial_metrics", "Margin, liquidity and leverage metrics", true, 800),
        feature("industry_benchmarking", "Comparison against industry benchmarks", professional_plus, 600),
        feature("trend_analysis", "Historical trends with forecasts", professional_plus, 700),
        feature("scenario_planning", "Base, optimistic and pessimistic scenarios", enterprise, 1200),
        feature("strategic_insights", "Capital structure and value driver analysis", enterprise, 1000),
    ];

    let limitations = match tier {
        Tier::Consumer => vec![
            limitation(LimitationKind::Token, 1000.0, "Summarize context to the key financial figures"),
            limitation(LimitationKind::Complexity, 0.5, "Use a simplified single-pass analysis"),
            limitation(LimitationKind::Frequency, 10.0, "Queue additional requests until the next day"),
        ],
        Tier::Professional => vec![
            limitation(LimitationKind::Token, 3000.0, "Trim examples and lower-priority sections"),
            limitation(LimitationKind::Complexity, 0.8, "Skip scenario modelling"),
            limitation(LimitationKind::Frequency, 100.0, "Queue additional requests until the next day"),
        ],
        Tier::Enterprise => vec![limitation(
            LimitationKind::Token,
            8000.0,
            "Compress lower-priority sections",
        )],
    };

    let mut capabilities = Vec::new();
    if professional_plus {
        capabilities.push(capability(
            "contextual_memory",
            "Carries prior analyses into the prompt context",
            500,
            1.15,
        ));
    }
    if enterprise {
        capabilities.push(capability(
            "real_time_data",
            "Augments the context with current market data",
            800,
            1.2,
        ));
        capabilities.push(capability(
            "custom_algorithms",
            "Applies custom valuation models",
            1000,
            1.25,
        ));
    }

    TierProfile {
        tier,
        features,
        limitations,
        capabilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_by_tier() {
        assert!(tier_profile(Tier::Consumer).capabilities.is_empty());
        let pro = tier_profile(Tier::Professional);
        assert!(pro.has_capability("contextual_memory"));
        assert!(!pro.has_capability("real_time_data"));
        let ent = tier_profile(Tier::Enterprise);
        assert_eq!(ent.capabilities.len(), 3);
        assert!((ent.quality_boost() - 1.15 * 1.2 * 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_token_limitation_matches_tier_limit() {
        for tier in Tier::all() {
            let profile = tier_profile(tier);
            let token = profile
                .limitations
                .iter()
                .find(|l| l.kind == LimitationKind::Token)
                .unwrap();
            assert_eq!(token.threshold as usize, tier.token_limit());
        }
    }

    #[test]
    fn test_feature_availability() {
        let consumer = tier_profile(Tier::Consumer);
        let available: Vec<&str> = consumer
            .features
            .iter()
            .filter(|f| f.available)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(available, vec!["basic_analysis", "financial_metrics"]);
    }
}
