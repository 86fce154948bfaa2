use tracing::{debug, info, warn};
use valuation_core::Tier;

use crate::benchmark::build_benchmark_comparisons;
use crate::enterprise::{build_capital_structure, build_dcf_estimate, build_scenario_projections};
use crate::financial::build_financial_metrics;
use crate::input::{EnterpriseTierData, ProfessionalTierData};
use crate::insights::{build_enriched_insights, InsightInputs};
use crate::market::build_market_context;
use crate::operational::build_operational_metrics;
use crate::profile::build_business_profile;
use crate::quality::build_data_quality;
use crate::risk::build_risk_profile;
use crate::strategic::{build_strategic_context, build_value_drivers};
use crate::types::AnalysisContext;

/// Build the professional-tier context. Never fails on partial data.
pub fn build_professional_context(data: &ProfessionalTierData) -> AnalysisContext {
    let business_profile = build_business_profile(data);
    let financial_metrics = build_financial_metrics(data);
    let operational_metrics = build_operational_metrics(data);
    let strategic_context = build_strategic_context(data);
    let market_context = build_market_context(data);
    let risk_profile = build_risk_profile(data, &financial_metrics, &operational_metrics, &market_context);
    let benchmark_comparisons = build_benchmark_comparisons(&business_profile, &financial_metrics);
    let data_quality = build_data_quality(data, &financial_metrics);
    let enriched_insights = build_enriched_insights(&InsightInputs {
        data,
        financial: &financial_metrics,
        operational: &operational_metrics,
        strategic: &strategic_context,
        risk: &risk_profile,
        benchmarks: &benchmark_comparisons,
        competitive_intensity: market_context.competitive_intensity,
    });

    info!(
        tier = "professional",
        size = business_profile.size.as_str(),
        stage = business_profile.stage.as_str(),
        completeness = data_quality.completeness.overall,
        "Analysis context built"
    );
    if !financial_metrics.defaulted_fields.is_empty() {
        debug!(fields = ?financial_metrics.defaulted_fields, "Financial fields defaulted");
    }
    if !data.rejected_fields.is_empty() {
        warn!(fields = ?data.rejected_fields, "Unreadable questionnaire values replaced by defaults");
    }

    AnalysisContext {
        tier: Tier::Professional,
        business_profile,
        financial_metrics,
        operational_metrics,
        strategic_context,
        market_context,
        risk_profile,
        benchmark_comparisons,
        data_quality,
        enriched_insights,
        focus: None,
    }
}

/// Build the enterprise-tier context: the professional context plus
/// capital structure, scenario projections, DCF and value drivers.
pub fn build_enterprise_context(data: &EnterpriseTierData) -> AnalysisContext {
    let mut context = build_professional_context(&data.professional);
    context.tier = Tier::Enterprise;

    let performance = &context.financial_metrics.performance;
    let capital = build_capital_structure(data, performance);
    let projections = build_scenario_projections(data, performance);
    let dcf = build_dcf_estimate(performance, &capital, &projections);

    context.financial_metrics.performance.leverage.capital_structure = Some(capital);
    context.financial_metrics.projections = Some(projections);
    if let Some(valuation) = context.financial_metrics.valuation.as_mut() {
        valuation.dcf = Some(dcf);
    }

    let drivers = build_value_drivers(data.value_drivers.as_ref());
    context.strategic_context.value_drivers = Some(drivers);

    info!(
        tier = "enterprise",
        scenarios = context
            .financial_metrics
            .projections
            .as_ref()
            .map_or(0, |p| p.scenarios.len()),
        "Enterprise overlay applied"
    );

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_builds() {
        let context = build_professional_context(&ProfessionalTierData::default());
        assert_eq!(context.tier, Tier::Professional);
        assert_eq!(context.financial_metrics.performance.revenue.current, 0.0);
        assert!(context.focus.is_none());
    }

    #[test]
    fn test_enterprise_sets_overlays() {
        let context = build_enterprise_context(&EnterpriseTierData::default());
        assert_eq!(context.tier, Tier::Enterprise);
        assert!(context.financial_metrics.performance.leverage.capital_structure.is_some());
        assert!(context.strategic_context.value_drivers.is_some());
        let valuation = context.financial_metrics.valuation.as_ref().unwrap();
        assert!(valuation.dcf.is_some());
    }
}
