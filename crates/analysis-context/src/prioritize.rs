use tracing::debug;
use valuation_core::display::{format_currency, format_percent, format_ratio};
use valuation_core::stats::{mean, percent_of};
use valuation_core::{AnalysisType, Tier};

use crate::types::{AnalysisContext, AnalysisFocus, ContextArea, DerivedInsight, PriorityWeights};

/// Completeness below which projected and valuation figures are dropped.
pub const LOW_CONFIDENCE_COMPLETENESS: f64 = 70.0;
/// Weight above which an area receives derived insights.
pub const ENHANCEMENT_THRESHOLD: f64 = 0.7;
const ENTERPRISE_WEIGHT_BONUS: f64 = 0.1;

const fn weights(financial: f64, operational: f64, strategic: f64, market: f64, risk: f64) -> PriorityWeights {
    PriorityWeights {
        financial,
        operational,
        strategic,
        market,
        risk,
    }
}

/// Area weights for an analysis type; enterprise favours strategy and risk.
pub fn priority_weights(tier: Tier, analysis_type: AnalysisType) -> PriorityWeights {
    let base = match analysis_type {
        AnalysisType::Comprehensive => weights(0.6, 0.5, 0.6, 0.5, 0.5),
        AnalysisType::Valuation => weights(0.9, 0.5, 0.6, 0.6, 0.6),
        AnalysisType::FinancialAnalysis => weights(0.95, 0.5, 0.3, 0.3, 0.5),
        AnalysisType::RiskAssessment => weights(0.6, 0.6, 0.4, 0.5, 0.9),
        AnalysisType::StrategicPlanning => weights(0.5, 0.4, 0.9, 0.7, 0.5),
        AnalysisType::MarketAnalysis => weights(0.4, 0.3, 0.6, 0.9, 0.4),
        AnalysisType::OperationalAnalysis => weights(0.5, 0.9, 0.4, 0.3, 0.4),
        AnalysisType::CompetitiveAnalysis => weights(0.4, 0.4, 0.8, 0.8, 0.4),
    };
    match tier {
        Tier::Enterprise => PriorityWeights {
            strategic: (base.strategic + ENTERPRISE_WEIGHT_BONUS).min(1.0),
            risk: (base.risk + ENTERPRISE_WEIGHT_BONUS).min(1.0),
            ..base
        },
        _ => base,
    }
}

fn insight(area: ContextArea, label: &str, value: String) -> DerivedInsight {
    DerivedInsight {
        area,
        label: label.to_string(),
        value,
    }
}

fn derive_insights(ctx: &AnalysisContext, area: ContextArea) -> Vec<DerivedInsight> {
    let p = &ctx.financial_metrics.performance;
    match area {
        ContextArea::Financial => vec![
            insight(area, "Cash conversion", format_percent(p.cash_flow.cash_conversion)),
            insight(
                area,
                "Free cash flow margin",
                format_percent(percent_of(p.cash_flow.free_cash_flow, p.revenue.current)),
            ),
            insight(area, "Interest coverage", format_ratio(p.leverage.interest_coverage)),
            insight(area, "Working capital", format_currency(p.liquidity.working_capital)),
        ],
        ContextArea::Operational => {
            let o = &ctx.operational_metrics;
            let mut out = vec![
                insight(
                    area,
                    "Revenue per employee",
                    format_currency(o.efficiency.revenue_per_employee),
                ),
                insight(
                    area,
                    "Operational readiness",
                    format!(
                        "{:.0}/100",
                        mean(&[o.efficiency.overall, o.process_maturity, o.technology_adoption])
                    ),
                ),
            ];
            if let Some(ratio) = o.customer.ltv_to_cac {
                out.push(insight(area, "LTV/CAC", format_ratio(ratio)));
            }
            out
        }
        ContextArea::Strategic => {
            let s = &ctx.strategic_context;
            vec![
                insight(area, "Moat strength", format!("{:.0}/100", s.moat_strength)),
                insight(
                    area,
                    "Strategic initiatives",
                    (s.growth_strategies.len() + s.strategic_priorities.len()).to_string(),
                ),
            ]
        }
        ContextArea::Market => {
            let m = &ctx.market_context;
            let mut out = vec![insight(
                area,
                "Competitive intensity",
                m.competitive_intensity.as_str().to_string(),
            )];
            if let Some(size) = m.market_size.filter(|s| *s > 0.0) {
                out.push(insight(
                    area,
                    "Implied revenue share",
                    format_percent(percent_of(p.revenue.current, size)),
                ));
            }
            out
        }
        ContextArea::Risk => {
            let r = &ctx.risk_profile;
            let categories = [
                ("financial", r.categories.financial),
                ("operational", r.categories.operational),
                ("market", r.categories.market),
                ("regulatory", r.categories.regulatory),
            ];
            let (name, score) = categories
                .into_iter()
                .fold(("financial", f64::MIN), |best, c| if c.1 > best.1 { c } else { best });
            vec![
                insight(area, "Highest risk category", format!("{} ({:.0}/100)", name, score)),
                insight(area, "Risk level", r.level.as_str().to_string()),
            ]
        }
    }
}

/// Apply analysis-specific weights to a context.
///
/// Low-completeness contexts lose their projected and valuation figures;
/// heavily weighted areas gain derived insights. Nothing else changes.
pub fn prioritize_context_data(ctx: &AnalysisContext, analysis_type: AnalysisType) -> AnalysisContext {
    let mut out = ctx.clone();
    let weights = priority_weights(ctx.tier, analysis_type);
    let mut filtered_fields = Vec::new();

    if ctx.data_quality.completeness.overall < LOW_CONFIDENCE_COMPLETENESS {
        let fm = &mut out.financial_metrics;
        if fm.projections.take().is_some() {
            filtered_fields.push("financialMetrics.projections".to_string());
        }
        if fm.valuation.take().is_some() {
            filtered_fields.push("financialMetrics.valuation".to_string());
        }
        if !fm.trends.revenue.forecast.is_empty() {
            fm.trends.revenue.forecast.clear();
            filtered_fields.push("financialMetrics.trends.revenue.forecast".to_string());
        }
        if !fm.trends.net_income.forecast.is_empty() {
            fm.trends.net_income.forecast.clear();
            filtered_fields.push("financialMetrics.trends.netIncome.forecast".to_string());
        }
    }

    let enhanced_areas: Vec<ContextArea> = weights
        .entries()
        .into_iter()
        .filter(|(_, w)| *w > ENHANCEMENT_THRESHOLD)
        .map(|(area, _)| area)
        .collect();
    let derived = enhanced_areas
        .iter()
        .flat_map(|&area| derive_insights(ctx, area))
        .collect();

    debug!(
        analysis_type = analysis_type.as_str(),
        enhanced = enhanced_areas.len(),
        filtered = filtered_fields.len(),
        "Context prioritized"
    );

    out.focus = Some(AnalysisFocus {
        analysis_type,
        weights,
        enhanced_areas,
        filtered_fields,
        derived,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_professional_context;
    use crate::input::ProfessionalTierData;

    #[test]
    fn test_enterprise_bonus_is_capped() {
        let pro = priority_weights(Tier::Professional, AnalysisType::RiskAssessment);
        let ent = priority_weights(Tier::Enterprise, AnalysisType::RiskAssessment);
        assert!((ent.risk - 1.0).abs() < 1e-9);
        assert!((ent.strategic - (pro.strategic + 0.1)).abs() < 1e-9);
        assert_eq!(ent.financial, pro.financial);
    }

    #[test]
    fn test_low_completeness_filters_projections() {
        let ctx = build_professional_context(&ProfessionalTierData::default());
        assert!(ctx.financial_metrics.projections.is_some());
        let prioritized = prioritize_context_data(&ctx, AnalysisType::Valuation);
        assert!(prioritized.financial_metrics.projections.is_none());
        assert!(prioritized.financial_metrics.valuation.is_none());
        let focus = prioritized.focus.unwrap();
        assert!(focus.filtered_fields.contains(&"financialMetrics.valuation".to_string()));
        // performance is untouched
        assert_eq!(prioritized.financial_metrics.performance, ctx.financial_metrics.performance);
    }

    #[test]
    fn test_heavy_weights_enhance_areas() {
        let ctx = build_professional_context(&ProfessionalTierData::default());
        let prioritized = prioritize_context_data(&ctx, AnalysisType::OperationalAnalysis);
        let focus = prioritized.focus.unwrap();
        assert_eq!(focus.enhanced_areas, vec![ContextArea::Operational]);
        assert!(focus.derived.iter().all(|d| d.area == ContextArea::Operational));
        assert!(!focus.derived.is_empty());
    }
}
