use valuation_core::stats::clamp_score;

use crate::input::{ProfessionalTierData, ValueDriverData};
use crate::types::{StrategicContext, StrategicValueDrivers};

pub fn build_strategic_context(data: &ProfessionalTierData) -> StrategicContext {
    let strategy = data.strategy.clone().unwrap_or_default();
    let moat_strength = clamp_score(strategy.competitive_advantages.len() as f64 * 20.0, 0.0, 100.0);

    StrategicContext {
        competitive_advantages: strategy.competitive_advantages,
        growth_strategies: strategy.growth_strategies,
        strategic_priorities: strategy.strategic_priorities,
        innovation_investment: strategy
            .innovation_investment
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        moat_strength,
        partnerships: strategy.partnerships,
        value_drivers: None,
    }
}

/// Enterprise value drivers: IP, synergies, brand and recurring revenue.
pub fn build_value_drivers(drivers: Option<&ValueDriverData>) -> StrategicValueDrivers {
    let drivers = drivers.cloned().unwrap_or_default();
    let brand_strength = clamp_score(drivers.brand_strength.unwrap_or(50.0), 0.0, 100.0);
    let recurring = clamp_score(drivers.recurring_revenue_percent.unwrap_or(0.0), 0.0, 100.0);
    let ip_score = clamp_score(drivers.intellectual_property.len() as f64 * 25.0, 0.0, 100.0);
    let synergy_score = clamp_score(drivers.synergy_opportunities.len() as f64 * 25.0, 0.0, 100.0);
    let driver_score = clamp_score(
        ip_score * 0.25 + synergy_score * 0.2 + brand_strength * 0.25 + recurring * 0.3,
        0.0,
        100.0,
    );

    StrategicValueDrivers {
        intellectual_property: drivers.intellectual_property,
        synergy_opportunities: drivers.synergy_opportunities,
        brand_strength,
        recurring_revenue_percent: recurring,
        driver_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StrategyData;

    #[test]
    fn test_moat_strength_caps_at_100() {
        let data = ProfessionalTierData {
            strategy: Some(StrategyData {
                competitive_advantages: (0..7).map(|i| format!("advantage {}", i)).collect(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(build_strategic_context(&data).moat_strength, 100.0);
        assert_eq!(build_strategic_context(&ProfessionalTierData::default()).moat_strength, 0.0);
    }

    #[test]
    fn test_value_driver_score() {
        let drivers = ValueDriverData {
            intellectual_property: vec!["patent".into(), "trademark".into()],
            synergy_opportunities: vec![],
            brand_strength: Some(80.0),
            recurring_revenue_percent: Some(60.0),
        };
        let vd = build_value_drivers(Some(&drivers));
        // 50*0.25 + 0 + 80*0.25 + 60*0.3
        assert!((vd.driver_score - 50.5).abs() < 1e-9);
        assert_eq!(build_value_drivers(None).brand_strength, 50.0);
    }
}
