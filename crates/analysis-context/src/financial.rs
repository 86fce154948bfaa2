use valuation_core::stats::{finite_or, percent_of, safe_div};
use valuation_core::BusinessSize;

use crate::input::{FinancialPerformanceData, ProfessionalTierData};
use crate::profile::determine_business_size;
use crate::trend::{analyze_trend, period_deltas, DEFAULT_FORECAST_PERIODS};
use crate::types::{
    CashFlowMetrics, EfficiencyMetrics, FinancialPerformance, FinancialProjections,
    FinancialTrends, LeverageMetrics, LiquidityMetrics, MarginMetric, ProcessedFinancialMetrics,
    Profitability, ProjectedYear, ProjectionMethod, RevenueMetrics, TrendAnalysis, ValuationRanges,
    ValueRange,
};

/// Financial inputs after default substitution.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedFinancials {
    pub revenue: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    pub ebitda: f64,
    pub net_income: f64,
    pub operating_cash_flow: f64,
    pub capital_expenditures: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub cash: f64,
    pub inventory: f64,
    pub accounts_receivable: f64,
    pub total_debt: f64,
    pub interest_expense: f64,
    pub defaulted: Vec<String>,
}

impl ResolvedFinancials {
    pub fn equity(&self) -> f64 {
        self.total_assets - self.total_liabilities
    }
}

/// Take `value` when present and finite, otherwise `fallback` and record `name`.
fn resolve(value: Option<f64>, fallback: f64, name: &str, defaulted: &mut Vec<String>) -> f64 {
    match value.filter(|v| v.is_finite()) {
        Some(v) => v,
        None => {
            defaulted.push(name.to_string());
            finite_or(fallback, 0.0)
        }
    }
}

pub(crate) fn resolve_financials(fin: &FinancialPerformanceData) -> ResolvedFinancials {
    let mut d = Vec::new();

    let revenue = resolve(fin.annual_revenue, 0.0, "annualRevenue", &mut d);
    let gross_profit = resolve(fin.gross_profit, revenue * 0.30, "grossProfit", &mut d);
    let operating_income = resolve(fin.operating_income, revenue * 0.15, "operatingIncome", &mut d);
    let ebitda = resolve(fin.ebitda, operating_income * 1.15, "ebitda", &mut d);
    let net_income = resolve(fin.net_income, revenue * 0.10, "netIncome", &mut d);
    let operating_cash_flow =
        resolve(fin.operating_cash_flow, net_income * 1.1, "operatingCashFlow", &mut d);
    let capital_expenditures =
        resolve(fin.capital_expenditures, revenue * 0.05, "capitalExpenditures", &mut d);
    let total_assets = resolve(fin.total_assets, revenue * 0.8, "totalAssets", &mut d);
    let total_liabilities =
        resolve(fin.total_liabilities, total_assets * 0.4, "totalLiabilities", &mut d);
    let current_assets = resolve(fin.current_assets, total_assets * 0.4, "currentAssets", &mut d);
    let current_liabilities = resolve(
        fin.current_liabilities,
        total_liabilities * 0.5,
        "currentLiabilities",
        &mut d,
    );
    let cash = resolve(fin.cash, current_assets * 0.3, "cash", &mut d);
    let inventory = resolve(fin.inventory, 0.0, "inventory", &mut d);
    let accounts_receivable =
        resolve(fin.accounts_receivable, revenue * 0.12, "accountsReceivable", &mut d);
    let total_debt = resolve(fin.total_debt, total_liabilities * 0.6, "totalDebt", &mut d);
    let interest_expense = resolve(fin.interest_expense, total_debt * 0.05, "interestExpense", &mut d);

    ResolvedFinancials {
        revenue,
        gross_profit,
        operating_income,
        ebitda,
        net_income,
        operating_cash_flow,
        capital_expenditures,
        total_assets,
        total_liabilities,
        current_assets,
        current_liabilities,
        cash,
        inventory,
        accounts_receivable,
        total_debt,
        interest_expense,
        defaulted: d,
    }
}

/// Historical revenue with the current year appended when it is newer.
pub(crate) fn revenue_series(fin: &FinancialPerformanceData) -> Vec<f64> {
    let mut series: Vec<f64> = fin
        .historical_revenue
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if let Some(current) = fin.annual_revenue.filter(|v| v.is_finite()) {
        if series.last().map_or(true, |&last| last != current) {
            series.push(current);
        }
    }
    series
}

/// Revenue growth in percent: reported rate, else last historical change, else 0.
pub fn resolve_growth_rate(data: &ProfessionalTierData) -> f64 {
    let Some(fin) = data.financial_performance.as_ref() else {
        return 0.0;
    };
    if let Some(rate) = fin.revenue_growth_rate.filter(|r| r.is_finite()) {
        return rate;
    }
    period_deltas(&revenue_series(fin))
        .last()
        .map(|d| d * 100.0)
        .unwrap_or(0.0)
}

fn margin(amount: f64, revenue: f64) -> MarginMetric {
    MarginMetric {
        amount,
        margin: percent_of(amount, revenue),
    }
}

pub(crate) fn build_performance(r: &ResolvedFinancials, growth_rate: f64, historical: Vec<f64>) -> FinancialPerformance {
    let equity = r.equity();
    FinancialPerformance {
        revenue: RevenueMetrics {
            current: r.revenue,
            growth_rate,
            historical,
        },
        profitability: Profitability {
            gross: margin(r.gross_profit, r.revenue),
            operating: margin(r.operating_income, r.revenue),
            net: margin(r.net_income, r.revenue),
            ebitda: margin(r.ebitda, r.revenue),
        },
        cash_flow: CashFlowMetrics {
            operating: r.operating_cash_flow,
            capital_expenditures: r.capital_expenditures,
            free_cash_flow: r.operating_cash_flow - r.capital_expenditures,
            cash_conversion: percent_of(r.operating_cash_flow, r.net_income),
        },
        efficiency: EfficiencyMetrics {
            asset_turnover: safe_div(r.revenue, r.total_assets),
            receivables_days: if r.revenue > 0.0 {
                r.accounts_receivable / r.revenue * 365.0
            } else {
                0.0
            },
            inventory_days: if r.revenue > 0.0 {
                r.inventory / r.revenue * 365.0
            } else {
                0.0
            },
        },
        leverage: LeverageMetrics {
            total_debt: r.total_debt,
            debt_to_equity: if equity > 0.0 { r.total_debt / equity } else { 0.0 },
            debt_to_assets: safe_div(r.total_debt, r.total_assets),
            interest_coverage: if r.interest_expense > 0.0 {
                r.operating_income / r.interest_expense
            } else {
                0.0
            },
            capital_structure: None,
        },
        liquidity: LiquidityMetrics {
            current_ratio: safe_div(r.current_assets, r.current_liabilities),
            quick_ratio: safe_div(r.current_assets - r.inventory, r.current_liabilities),
            cash: r.cash,
            working_capital: r.current_assets - r.current_liabilities,
        },
    }
}

/// Three yearly projections extending the revenue trend.
pub(crate) fn trend_projections(current_revenue: f64, trend: &TrendAnalysis) -> FinancialProjections {
    let mut previous = current_revenue;
    let years = trend
        .forecast
        .iter()
        .enumerate()
        .map(|(i, &revenue)| {
            let growth_rate = if previous > 0.0 {
                (revenue - previous) / previous * 100.0
            } else {
                0.0
            };
            previous = revenue;
            ProjectedYear {
                year_offset: i as u32 + 1,
                revenue,
                growth_rate,
            }
        })
        .collect();

    FinancialProjections {
        method: ProjectionMethod::TrendExtrapolation,
        years,
        scenarios: Vec::new(),
    }
}

/// Multiple-based valuation ranges by size bucket.
pub fn valuation_ranges(size: BusinessSize, revenue: f64, ebitda: f64) -> ValuationRanges {
    let (rev_multiples, ebitda_multiples) = match size {
        BusinessSize::Small => ((0.8, 1.2, 1.8), (4.0, 5.0, 6.0)),
        BusinessSize::Medium => ((1.0, 1.6, 2.4), (5.0, 7.0, 9.0)),
        BusinessSize::Large => ((1.5, 2.5, 3.5), (7.0, 9.0, 12.0)),
    };
    let revenue = revenue.max(0.0);
    let ebitda = ebitda.max(0.0);
    ValuationRanges {
        revenue_multiple: ValueRange {
            low: revenue * rev_multiples.0,
            mid: revenue * rev_multiples.1,
            high: revenue * rev_multiples.2,
        },
        ebitda_multiple: ValueRange {
            low: ebitda * ebitda_multiples.0,
            mid: ebitda * ebitda_multiples.1,
            high: ebitda * ebitda_multiples.2,
        },
        dcf: None,
    }
}

/// Professional-tier financial metrics.
pub fn build_financial_metrics(data: &ProfessionalTierData) -> ProcessedFinancialMetrics {
    let fin = data.financial_performance.clone().unwrap_or_default();
    let resolved = resolve_financials(&fin);
    let series = revenue_series(&fin);
    let growth_rate = resolve_growth_rate(data);

    let revenue_trend = analyze_trend(&series, DEFAULT_FORECAST_PERIODS);
    let net_income_trend = analyze_trend(&fin.historical_net_income, DEFAULT_FORECAST_PERIODS);
    let projections = trend_projections(resolved.revenue, &revenue_trend);
    let valuation = valuation_ranges(
        determine_business_size(resolved.revenue),
        resolved.revenue,
        resolved.ebitda,
    );

    ProcessedFinancialMetrics {
        performance: build_performance(&resolved, growth_rate, fin.historical_revenue.clone()),
        trends: FinancialTrends {
            revenue: revenue_trend,
            net_income: net_income_trend,
        },
        projections: Some(projections),
        valuation: Some(valuation),
        defaulted_fields: resolved.defaulted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with(fin: FinancialPerformanceData) -> ProfessionalTierData {
        ProfessionalTierData {
            financial_performance: Some(fin),
            ..Default::default()
        }
    }

    #[test]
    fn test_gross_margin_from_reported_figures() {
        let metrics = build_financial_metrics(&data_with(FinancialPerformanceData {
            annual_revenue: Some(15_000_000.0),
            gross_profit: Some(11_250_000.0),
            ..Default::default()
        }));
        let gross = metrics.performance.profitability.gross;
        assert!((gross.margin - 75.0).abs() < 0.1);
        assert!(!metrics.defaulted_fields.contains(&"grossProfit".to_string()));
    }

    #[test]
    fn test_gross_profit_defaults_to_thirty_percent() {
        let metrics = build_financial_metrics(&data_with(FinancialPerformanceData {
            annual_revenue: Some(2_000_000.0),
            ..Default::default()
        }));
        let gross = metrics.performance.profitability.gross;
        assert!((gross.amount - 600_000.0).abs() < 1e-6);
        assert!((gross.margin - 30.0).abs() < 1e-9);
        assert!(metrics.defaulted_fields.contains(&"grossProfit".to_string()));
    }

    #[test]
    fn test_empty_financials_are_finite() {
        let metrics = build_financial_metrics(&ProfessionalTierData::default());
        let p = &metrics.performance;
        assert_eq!(p.revenue.current, 0.0);
        assert_eq!(p.profitability.gross.margin, 0.0);
        assert!(p.liquidity.current_ratio.is_finite());
        assert!(p.efficiency.asset_turnover.is_finite());
        assert!(p.cash_flow.cash_conversion.is_finite());
        assert!(metrics.defaulted_fields.contains(&"annualRevenue".to_string()));
    }

    #[test]
    fn test_growth_rate_from_history() {
        let data = data_with(FinancialPerformanceData {
            annual_revenue: Some(15_000_000.0),
            historical_revenue: vec![10_000_000.0, 12_000_000.0],
            ..Default::default()
        });
        assert!((resolve_growth_rate(&data) - 25.0).abs() < 1e-9);
        let metrics = build_financial_metrics(&data);
        assert_eq!(metrics.trends.revenue.direction, crate::types::TrendDirection::Improving);
        let projections = metrics.projections.unwrap();
        assert_eq!(projections.years.len(), 3);
        assert!(projections.years[0].revenue > 15_000_000.0);
    }

    #[test]
    fn test_reported_growth_rate_wins() {
        let data = data_with(FinancialPerformanceData {
            revenue_growth_rate: Some(7.5),
            historical_revenue: vec![1.0, 2.0],
            ..Default::default()
        });
        assert_eq!(resolve_growth_rate(&data), 7.5);
    }

    #[test]
    fn test_valuation_ranges_ordered() {
        let v = valuation_ranges(BusinessSize::Medium, 20_000_000.0, 4_000_000.0);
        assert!(v.revenue_multiple.low < v.revenue_multiple.mid);
        assert!(v.revenue_multiple.mid < v.revenue_multiple.high);
        assert!((v.ebitda_multiple.mid - 28_000_000.0).abs() < 1e-6);
    }
}
