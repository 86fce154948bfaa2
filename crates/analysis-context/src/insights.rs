use valuation_core::display::{format_percent, format_ratio};

use crate::input::ProfessionalTierData;
use crate::types::{
    BenchmarkComparisons, BenchmarkPosition, EnrichedInsights, Intensity, OperationalMetrics,
    ProcessedFinancialMetrics, RiskLevel, RiskProfile, StrategicContext, TrendDirection,
};

const STRONG_RETENTION: f64 = 90.0;
const WEAK_RETENTION: f64 = 70.0;
const HIGH_CUSTOMER_CONCENTRATION: f64 = 30.0;
const STRONG_MOAT: f64 = 60.0;
const HEALTHY_LTV_TO_CAC: f64 = 3.0;
const HIGH_LEVERAGE: f64 = 2.0;
const HIGH_GROWTH: f64 = 20.0;

/// Sections an insight pass reads from; all are already-built context parts.
pub struct InsightInputs<'a> {
    pub data: &'a ProfessionalTierData,
    pub financial: &'a ProcessedFinancialMetrics,
    pub operational: &'a OperationalMetrics,
    pub strategic: &'a StrategicContext,
    pub risk: &'a RiskProfile,
    pub benchmarks: &'a BenchmarkComparisons,
    pub competitive_intensity: Intensity,
}

fn benchmark_position(benchmarks: &BenchmarkComparisons, metric: &str) -> Option<BenchmarkPosition> {
    benchmarks
        .metrics
        .iter()
        .find(|m| m.metric == metric)
        .map(|m| m.position)
}

pub fn build_enriched_insights(inputs: &InsightInputs<'_>) -> EnrichedInsights {
    let mut insights = EnrichedInsights::default();
    let p = &inputs.financial.performance;

    match benchmark_position(inputs.benchmarks, "gross_margin") {
        Some(BenchmarkPosition::Above) => insights.strengths.push(format!(
            "Gross margin of {} is above the {} benchmark",
            format_percent(p.profitability.gross.margin),
            inputs.benchmarks.industry
        )),
        Some(BenchmarkPosition::Below) => insights.concerns.push(format!(
            "Gross margin of {} trails the {} benchmark",
            format_percent(p.profitability.gross.margin),
            inputs.benchmarks.industry
        )),
        _ => {}
    }

    if p.revenue.growth_rate >= HIGH_GROWTH {
        insights.strengths.push(format!(
            "Strong revenue growth of {}",
            format_percent(p.revenue.growth_rate)
        ));
    } else if p.revenue.growth_rate < 0.0 {
        insights.concerns.push(format!(
            "Revenue contracting at {}",
            format_percent(p.revenue.growth_rate)
        ));
    }

    match inputs.financial.trends.revenue.direction {
        TrendDirection::Improving => insights
            .value_drivers
            .push("Consistent upward revenue trend".to_string()),
        TrendDirection::Declining => insights
            .concerns
            .push("Historical revenue is declining".to_string()),
        TrendDirection::Stable => {}
    }

    if p.liquidity.current_ratio < 1.0 {
        insights.red_flags.push(format!(
            "Current ratio of {} indicates liquidity pressure",
            format_ratio(p.liquidity.current_ratio)
        ));
    }
    if p.profitability.net.amount < 0.0 {
        insights.red_flags.push("Business is operating at a net loss".to_string());
    }
    if p.leverage.debt_to_equity > HIGH_LEVERAGE {
        insights.concerns.push(format!(
            "High leverage with debt to equity of {}",
            format_ratio(p.leverage.debt_to_equity)
        ));
    }

    let customer = &inputs.operational.customer;
    if customer.retention_rate >= STRONG_RETENTION {
        insights.strengths.push(format!(
            "Excellent customer retention of {}",
            format_percent(customer.retention_rate)
        ));
        insights.value_drivers.push("Loyal, recurring customer base".to_string());
    } else if customer.retention_rate < WEAK_RETENTION {
        insights.concerns.push(format!(
            "Customer retention of {} is below healthy levels",
            format_percent(customer.retention_rate)
        ));
    }
    if let Some(ratio) = customer.ltv_to_cac {
        if ratio >= HEALTHY_LTV_TO_CAC {
            insights
                .value_drivers
                .push(format!("Efficient customer acquisition (LTV/CAC {})", format_ratio(ratio)));
        }
    }
    if inputs.operational.key_person_dependency {
        insights
            .concerns
            .push("Operations depend on key individuals".to_string());
    }

    if let Some(concentration) = inputs
        .data
        .risk
        .as_ref()
        .and_then(|r| r.customer_concentration)
    {
        if concentration > HIGH_CUSTOMER_CONCENTRATION {
            insights.concerns.push(format!(
                "Top customer accounts for {} of revenue",
                format_percent(concentration)
            ));
        }
    }

    if inputs.strategic.moat_strength >= STRONG_MOAT {
        insights
            .value_drivers
            .push("Multiple defensible competitive advantages".to_string());
    }
    for strategy in inputs.strategic.growth_strategies.iter().take(3) {
        insights.opportunities.push(format!("Growth via {}", strategy));
    }
    if inputs.competitive_intensity == Intensity::Low {
        insights
            .opportunities
            .push("Low competitive intensity leaves room to gain share".to_string());
    }

    if inputs.risk.level == RiskLevel::High {
        insights.red_flags.push(format!(
            "Overall risk score of {:.0} is high",
            inputs.risk.overall_score
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::build_benchmark_comparisons;
    use crate::financial::build_financial_metrics;
    use crate::input::{FinancialPerformanceData, OperationsData, RiskData};
    use crate::market::build_market_context;
    use crate::operational::build_operational_metrics;
    use crate::profile::build_business_profile;
    use crate::risk::build_risk_profile;
    use crate::strategic::build_strategic_context;

    fn insights_for(data: &ProfessionalTierData) -> EnrichedInsights {
        let profile = build_business_profile(data);
        let financial = build_financial_metrics(data);
        let operational = build_operational_metrics(data);
        let strategic = build_strategic_context(data);
        let market = build_market_context(data);
        let risk = build_risk_profile(data, &financial, &operational, &market);
        let benchmarks = build_benchmark_comparisons(&profile, &financial);
        build_enriched_insights(&InsightInputs {
            data,
            financial: &financial,
            operational: &operational,
            strategic: &strategic,
            risk: &risk,
            benchmarks: &benchmarks,
            competitive_intensity: market.competitive_intensity,
        })
    }

    #[test]
    fn test_liquidity_red_flag() {
        let data = ProfessionalTierData {
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(5_000_000.0),
                current_assets: Some(400_000.0),
                current_liabilities: Some(800_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let insights = insights_for(&data);
        assert!(insights.red_flags.iter().any(|f| f.contains("Current ratio")));
    }

    #[test]
    fn test_retention_and_concentration() {
        let data = ProfessionalTierData {
            operations: Some(OperationsData {
                customer_retention_rate: Some(95.0),
                ..Default::default()
            }),
            risk: Some(RiskData {
                customer_concentration: Some(45.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let insights = insights_for(&data);
        assert!(insights.strengths.iter().any(|s| s.contains("95.0%")));
        assert!(insights.concerns.iter().any(|c| c.contains("45.0%")));
    }
}
