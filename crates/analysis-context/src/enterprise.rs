//! Enterprise-only overlays applied on top of a professional context.

use valuation_core::stats::{clamp_score, mean, safe_div};

use crate::financial::{resolve_financials, revenue_series};
use crate::input::{CapitalStructureData, EnterpriseTierData, ScenarioPlanningData};
use crate::trend::period_deltas;
use crate::types::{
    CapitalStructure, DcfEstimate, FinancialPerformance, FinancialProjections, ProjectedYear,
    ProjectionMethod, Scenario, ValueRange,
};

pub const DEFAULT_WACC: f64 = 10.0;
pub const DEFAULT_CREDIT_RATING: &str = "unrated";
pub const TERMINAL_GROWTH: f64 = 3.0;
pub const DEFAULT_PROJECTION_YEARS: u32 = 5;
const MAX_PROJECTION_YEARS: u32 = 10;
const MIN_BASE_GROWTH: f64 = -5.0;
const MAX_BASE_GROWTH: f64 = 25.0;
const SCENARIO_SPREAD: f64 = 5.0;
// Keeps the Gordon denominator positive when WACC is at or below terminal growth.
const MIN_DISCOUNT_RATE: f64 = 6.0;
const DCF_RANGE_BAND: f64 = 0.15;

pub fn build_capital_structure(
    data: &EnterpriseTierData,
    performance: &FinancialPerformance,
) -> CapitalStructure {
    let input = data.capital_structure.clone().unwrap_or_default();
    let resolved = resolve_financials(
        &data
            .professional
            .financial_performance
            .clone()
            .unwrap_or_default(),
    );

    let equity_value = input
        .equity_value
        .filter(|v| v.is_finite())
        .unwrap_or_else(|| resolved.equity().max(0.0));
    let debt = performance.leverage.total_debt.max(0.0);
    let equity_ratio = if equity_value + debt > 0.0 {
        equity_value / (equity_value + debt) * 100.0
    } else {
        0.0
    };

    CapitalStructure {
        debt_to_equity: input
            .debt_to_equity
            .filter(|v| v.is_finite())
            .unwrap_or(performance.leverage.debt_to_equity),
        wacc: wacc(&input),
        credit_rating: input
            .credit_rating
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CREDIT_RATING.to_string()),
        equity_value,
        equity_ratio,
        debt_maturity_years: input.debt_maturity_years.filter(|v| v.is_finite()),
    }
}

fn wacc(input: &CapitalStructureData) -> f64 {
    input
        .weighted_average_cost_of_capital
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(DEFAULT_WACC)
}

/// Base-case growth: average historical revenue change, else the resolved growth rate.
fn trend_growth(data: &EnterpriseTierData, performance: &FinancialPerformance) -> f64 {
    let series = data
        .professional
        .financial_performance
        .as_ref()
        .map(revenue_series)
        .unwrap_or_default();
    let growth = if series.len() >= 2 {
        mean(&period_deltas(&series)) * 100.0
    } else {
        performance.revenue.growth_rate
    };
    clamp_score(growth, MIN_BASE_GROWTH, MAX_BASE_GROWTH)
}

fn project(revenue: f64, growth_rate: f64, years: u32) -> Vec<f64> {
    (1..=years)
        .map(|k| (revenue * (1.0 + growth_rate / 100.0).powi(k as i32)).max(0.0))
        .collect()
}

/// Base, optimistic and pessimistic revenue scenarios.
pub fn build_scenario_projections(
    data: &EnterpriseTierData,
    performance: &FinancialPerformance,
) -> FinancialProjections {
    let plan: ScenarioPlanningData = data.scenario_planning.clone().unwrap_or_default();
    let years = plan
        .projection_years
        .unwrap_or(DEFAULT_PROJECTION_YEARS)
        .clamp(1, MAX_PROJECTION_YEARS);
    let base = plan
        .base_case_growth
        .filter(|g| g.is_finite())
        .unwrap_or_else(|| trend_growth(data, performance));
    let optimistic = plan
        .optimistic_growth
        .filter(|g| g.is_finite())
        .unwrap_or(base + SCENARIO_SPREAD);
    let pessimistic = plan
        .pessimistic_growth
        .filter(|g| g.is_finite())
        .unwrap_or(base - SCENARIO_SPREAD);

    let revenue = performance.revenue.current.max(0.0);
    let scenario = |name: &str, growth_rate: f64, probability: f64| Scenario {
        name: name.to_string(),
        growth_rate,
        probability,
        projected_revenue: project(revenue, growth_rate, years),
    };
    let scenarios = vec![
        scenario("base", base, 0.5),
        scenario("optimistic", optimistic, 0.25),
        scenario("pessimistic", pessimistic, 0.25),
    ];

    let years = scenarios[0]
        .projected_revenue
        .iter()
        .enumerate()
        .map(|(i, &revenue)| ProjectedYear {
            year_offset: i as u32 + 1,
            revenue,
            growth_rate: base,
        })
        .collect();

    FinancialProjections {
        method: ProjectionMethod::Scenario,
        years,
        scenarios,
    }
}

/// DCF-lite: base-case free cash flow discounted at WACC plus a Gordon terminal value.
pub fn build_dcf_estimate(
    performance: &FinancialPerformance,
    capital: &CapitalStructure,
    projections: &FinancialProjections,
) -> DcfEstimate {
    let discount_rate = capital.wacc.max(MIN_DISCOUNT_RATE);
    let r = discount_rate / 100.0;
    let g = TERMINAL_GROWTH / 100.0;
    let fcf = performance.cash_flow.free_cash_flow;
    let base_growth = projections
        .scenarios
        .first()
        .map(|s| s.growth_rate / 100.0)
        .unwrap_or(0.0);
    let years = projections.years.len().max(1) as i32;

    let enterprise_value = if fcf > 0.0 {
        let mut pv = 0.0;
        let mut last_fcf = fcf;
        for k in 1..=years {
            last_fcf = fcf * (1.0 + base_growth).powi(k);
            pv += last_fcf / (1.0 + r).powi(k);
        }
        let terminal = safe_div(last_fcf * (1.0 + g), r - g);
        pv + terminal / (1.0 + r).powi(years)
    } else {
        0.0
    };

    let mid = (enterprise_value - performance.leverage.total_debt + performance.liquidity.cash).max(0.0);
    DcfEstimate {
        discount_rate,
        terminal_growth: TERMINAL_GROWTH,
        enterprise_value,
        equity_value: ValueRange {
            low: mid * (1.0 - DCF_RANGE_BAND),
            mid,
            high: mid * (1.0 + DCF_RANGE_BAND),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financial::build_financial_metrics;
    use crate::input::{FinancialPerformanceData, ProfessionalTierData};

    fn enterprise(fin: FinancialPerformanceData) -> EnterpriseTierData {
        EnterpriseTierData {
            professional: ProfessionalTierData {
                financial_performance: Some(fin),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_capital_structure_defaults() {
        let data = enterprise(FinancialPerformanceData {
            annual_revenue: Some(10_000_000.0),
            ..Default::default()
        });
        let perf = build_financial_metrics(&data.professional).performance;
        let capital = build_capital_structure(&data, &perf);
        assert_eq!(capital.wacc, DEFAULT_WACC);
        assert_eq!(capital.credit_rating, "unrated");
        // assets 8M, liabilities 3.2M, debt 1.92M
        assert!((capital.equity_value - 4_800_000.0).abs() < 1e-6);
        assert!(capital.equity_ratio > 0.0 && capital.equity_ratio < 100.0);
    }

    #[test]
    fn test_scenarios_are_ordered_and_clamped() {
        let data = enterprise(FinancialPerformanceData {
            annual_revenue: Some(10_000_000.0),
            historical_revenue: vec![1_000_000.0, 5_000_000.0],
            ..Default::default()
        });
        let perf = build_financial_metrics(&data.professional).performance;
        let projections = build_scenario_projections(&data, &perf);
        assert_eq!(projections.method, ProjectionMethod::Scenario);
        assert_eq!(projections.years.len(), DEFAULT_PROJECTION_YEARS as usize);
        let base = &projections.scenarios[0];
        assert_eq!(base.growth_rate, MAX_BASE_GROWTH);
        let optimistic = projections.scenarios[1].projected_revenue.last().copied().unwrap();
        let pessimistic = projections.scenarios[2].projected_revenue.last().copied().unwrap();
        assert!(optimistic > pessimistic);
        let total: f64 = projections.scenarios.iter().map(|s| s.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dcf_zero_for_negative_cash_flow() {
        let data = enterprise(FinancialPerformanceData {
            annual_revenue: Some(1_000_000.0),
            operating_cash_flow: Some(-50_000.0),
            ..Default::default()
        });
        let perf = build_financial_metrics(&data.professional).performance;
        let capital = build_capital_structure(&data, &perf);
        let projections = build_scenario_projections(&data, &perf);
        let dcf = build_dcf_estimate(&perf, &capital, &projections);
        assert_eq!(dcf.enterprise_value, 0.0);
        assert!(dcf.equity_value.low <= dcf.equity_value.mid);
    }

    #[test]
    fn test_dcf_positive_range() {
        let data = enterprise(FinancialPerformanceData {
            annual_revenue: Some(20_000_000.0),
            ..Default::default()
        });
        let perf = build_financial_metrics(&data.professional).performance;
        let capital = build_capital_structure(&data, &perf);
        let projections = build_scenario_projections(&data, &perf);
        let dcf = build_dcf_estimate(&perf, &capital, &projections);
        assert!(dcf.enterprise_value > 0.0);
        assert!(dcf.equity_value.low < dcf.equity_value.mid);
        assert!(dcf.equity_value.mid < dcf.equity_value.high);
        assert_eq!(dcf.terminal_growth, TERMINAL_GROWTH);
    }
}
