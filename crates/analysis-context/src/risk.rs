use valuation_core::stats::{clamp_score, mean};
use valuation_core::RiskTolerance;

use crate::input::ProfessionalTierData;
use crate::types::{
    Intensity, MarketContext, OperationalMetrics, ProcessedFinancialMetrics, RiskCategories,
    RiskLevel, RiskProfile,
};

const BASE_CATEGORY_RISK: f64 = 20.0;

fn financial_risk(financial: &ProcessedFinancialMetrics, flags: &mut Vec<String>) -> f64 {
    let p = &financial.performance;
    let mut score = BASE_CATEGORY_RISK;

    if p.leverage.debt_to_equity > 2.0 {
        score += 30.0;
        flags.push(format!("High leverage (debt/equity {:.2})", p.leverage.debt_to_equity));
    } else if p.leverage.debt_to_equity > 1.0 {
        score += 15.0;
    }

    if p.liquidity.current_ratio < 1.0 {
        score += 25.0;
        flags.push(format!("Liquidity pressure (current ratio {:.2})", p.liquidity.current_ratio));
    } else if p.liquidity.current_ratio < 1.5 {
        score += 10.0;
    }

    if p.profitability.net.amount < 0.0 {
        score += 25.0;
        flags.push("Operating at a net loss".to_string());
    }

    clamp_score(score, 0.0, 100.0)
}

fn operational_risk(
    operational: &OperationalMetrics,
    supplier_concentration: Option<f64>,
    flags: &mut Vec<String>,
) -> f64 {
    let mut score = BASE_CATEGORY_RISK;

    if operational.key_person_dependency {
        score += 30.0;
        flags.push("Key person dependency".to_string());
    }
    if operational.process_maturity < 40.0 {
        score += 20.0;
    }
    if operational.customer.retention_rate < 70.0 {
        score += 15.0;
        flags.push(format!(
            "Low customer retention ({:.1}%)",
            operational.customer.retention_rate
        ));
    }
    if let Some(s) = supplier_concentration.filter(|&s| s > 30.0) {
        score += 15.0;
        flags.push(format!("Supplier concentration ({:.1}% from largest supplier)", s));
    }

    clamp_score(score, 0.0, 100.0)
}

fn market_risk(
    market: &MarketContext,
    customer_concentration: Option<f64>,
    flags: &mut Vec<String>,
) -> f64 {
    let mut score = BASE_CATEGORY_RISK;

    match customer_concentration {
        Some(c) if c > 30.0 => {
            score += 30.0;
            flags.push(format!("Customer concentration ({:.1}% from top customer)", c));
        }
        Some(c) if c > 15.0 => score += 15.0,
        _ => {}
    }
    match market.competitive_intensity {
        Intensity::High => {
            score += 25.0;
            flags.push("Intense competition".to_string());
        }
        Intensity::Moderate => score += 10.0,
        Intensity::Low => {}
    }
    if market.growth_rate < 0.0 {
        score += 15.0;
        flags.push("Contracting market".to_string());
    }

    clamp_score(score, 0.0, 100.0)
}

fn regulatory_risk(market: &MarketContext, flags: &mut Vec<String>) -> f64 {
    match market.regulatory_environment {
        Intensity::Low => 15.0,
        Intensity::Moderate => 40.0,
        Intensity::High => {
            flags.push("Heavy regulatory environment".to_string());
            70.0
        }
    }
}

pub fn build_risk_profile(
    data: &ProfessionalTierData,
    financial: &ProcessedFinancialMetrics,
    operational: &OperationalMetrics,
    market: &MarketContext,
) -> RiskProfile {
    let risk = data.risk.clone().unwrap_or_default();
    let mut derived = Vec::new();

    let categories = RiskCategories {
        financial: financial_risk(financial, &mut derived),
        operational: operational_risk(operational, risk.supplier_concentration, &mut derived),
        market: market_risk(market, risk.customer_concentration, &mut derived),
        regulatory: regulatory_risk(market, &mut derived),
    };
    let overall_score = clamp_score(
        mean(&[
            categories.financial,
            categories.operational,
            categories.market,
            categories.regulatory,
        ]),
        0.0,
        100.0,
    );

    let mut key_risks = risk.key_risks;
    for flag in derived {
        if !key_risks.contains(&flag) {
            key_risks.push(flag);
        }
    }

    RiskProfile {
        overall_score,
        level: RiskLevel::from_score(overall_score),
        categories,
        key_risks,
        risk_tolerance: risk.risk_tolerance.unwrap_or(RiskTolerance::Moderate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financial::build_financial_metrics;
    use crate::input::{FinancialPerformanceData, OperationsData, RiskData};
    use crate::market::build_market_context;
    use crate::operational::build_operational_metrics;

    fn profile_for(data: &ProfessionalTierData) -> RiskProfile {
        let financial = build_financial_metrics(data);
        let operational = build_operational_metrics(data);
        let market = build_market_context(data);
        build_risk_profile(data, &financial, &operational, &market)
    }

    #[test]
    fn test_defaults_are_moderate() {
        let profile = profile_for(&ProfessionalTierData::default());
        assert!(profile.overall_score > 0.0 && profile.overall_score <= 100.0);
        assert_eq!(profile.risk_tolerance, RiskTolerance::Moderate);
    }

    #[test]
    fn test_concentration_and_key_person_raise_risk() {
        let risky = ProfessionalTierData {
            operations: Some(OperationsData {
                key_person_dependency: Some(true),
                ..Default::default()
            }),
            risk: Some(RiskData {
                key_risks: vec!["Pending litigation".to_string()],
                customer_concentration: Some(45.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let baseline = profile_for(&ProfessionalTierData::default());
        let profile = profile_for(&risky);
        assert!(profile.overall_score > baseline.overall_score);
        assert_eq!(profile.key_risks[0], "Pending litigation");
        assert!(profile.key_risks.iter().any(|r| r.starts_with("Customer concentration")));
        assert!(profile.key_risks.iter().any(|r| r == "Key person dependency"));
    }

    #[test]
    fn test_net_loss_flagged() {
        let data = ProfessionalTierData {
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(1_000_000.0),
                net_income: Some(-200_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let profile = profile_for(&data);
        assert!(profile.key_risks.iter().any(|r| r == "Operating at a net loss"));
    }
}
