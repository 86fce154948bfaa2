use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{AnalysisContext, FinancialPerformance, OperationalMetrics};

const MIN_USABLE_COMPLETENESS: f64 = 50.0;

/// A sanitized context plus what was found while checking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedContext {
    pub context: AnalysisContext,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidatedContext {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn performance_fields(p: &mut FinancialPerformance) -> Vec<(&'static str, &mut f64)> {
    vec![
        ("revenue.current", &mut p.revenue.current),
        ("revenue.growthRate", &mut p.revenue.growth_rate),
        ("profitability.gross.amount", &mut p.profitability.gross.amount),
        ("profitability.gross.margin", &mut p.profitability.gross.margin),
        ("profitability.operating.amount", &mut p.profitability.operating.amount),
        ("profitability.operating.margin", &mut p.profitability.operating.margin),
        ("profitability.net.amount", &mut p.profitability.net.amount),
        ("profitability.net.margin", &mut p.profitability.net.margin),
        ("profitability.ebitda.amount", &mut p.profitability.ebitda.amount),
        ("profitability.ebitda.margin", &mut p.profitability.ebitda.margin),
        ("cashFlow.operating", &mut p.cash_flow.operating),
        ("cashFlow.capitalExpenditures", &mut p.cash_flow.capital_expenditures),
        ("cashFlow.freeCashFlow", &mut p.cash_flow.free_cash_flow),
        ("cashFlow.cashConversion", &mut p.cash_flow.cash_conversion),
        ("efficiency.assetTurnover", &mut p.efficiency.asset_turnover),
        ("efficiency.receivablesDays", &mut p.efficiency.receivables_days),
        ("efficiency.inventoryDays", &mut p.efficiency.inventory_days),
        ("leverage.totalDebt", &mut p.leverage.total_debt),
        ("leverage.debtToEquity", &mut p.leverage.debt_to_equity),
        ("leverage.debtToAssets", &mut p.leverage.debt_to_assets),
        ("leverage.interestCoverage", &mut p.leverage.interest_coverage),
        ("liquidity.currentRatio", &mut p.liquidity.current_ratio),
        ("liquidity.quickRatio", &mut p.liquidity.quick_ratio),
        ("liquidity.cash", &mut p.liquidity.cash),
        ("liquidity.workingCapital", &mut p.liquidity.working_capital),
    ]
}

fn percentage_fields(o: &mut OperationalMetrics) -> Vec<(&'static str, &mut f64)> {
    vec![
        ("efficiency.overall", &mut o.efficiency.overall),
        ("efficiency.capacityUtilization", &mut o.efficiency.capacity_utilization),
        ("customer.retentionRate", &mut o.customer.retention_rate),
        ("scalabilityScore", &mut o.scalability_score),
        ("processMaturity", &mut o.process_maturity),
        ("technologyAdoption", &mut o.technology_adoption),
    ]
}

/// Negative reported figures paired with a positive derived metric.
fn consistency_errors(p: &FinancialPerformance) -> Vec<String> {
    let mut errors = Vec::new();
    let pairs = [
        ("Revenue", p.revenue.current, "gross margin", p.profitability.gross.margin),
        (
            "Operating income",
            p.profitability.operating.amount,
            "operating margin",
            p.profitability.operating.margin,
        ),
        ("Net income", p.profitability.net.amount, "net margin", p.profitability.net.margin),
    ];
    for (figure, value, metric, derived) in pairs {
        if value < 0.0 && derived > 0.0 {
            errors.push(format!("{} is negative while {} is positive", figure, metric));
        }
    }

    // Total assets are not carried on the context; recover their sign from revenue / turnover.
    let turnover = p.efficiency.asset_turnover;
    if turnover > 0.0 && p.revenue.current < 0.0 {
        errors.push("Total assets are negative while asset turnover is positive".to_string());
    }
    errors
}

/// Check a context for contradictions and out-of-range values.
///
/// Non-finite numbers become 0 and operational percentages are clamped to
/// 0-100, each with a warning. Consistency violations are reported as errors
/// and left in place.
pub fn validate_and_sanitize_context(ctx: &AnalysisContext) -> ValidatedContext {
    let mut context = ctx.clone();
    let mut warnings = Vec::new();

    for (name, value) in performance_fields(&mut context.financial_metrics.performance) {
        if !value.is_finite() {
            warnings.push(format!("financialMetrics.performance.{} was not finite; set to 0", name));
            *value = 0.0;
        }
    }

    for (name, value) in percentage_fields(&mut context.operational_metrics) {
        let current = *value;
        if !current.is_finite() {
            warnings.push(format!("operationalMetrics.{} was not finite; set to 0", name));
            *value = 0.0;
        } else if !(0.0..=100.0).contains(&current) {
            let clamped = current.clamp(0.0, 100.0);
            warnings.push(format!(
                "operationalMetrics.{} of {:.1} outside 0-100; clamped to {:.1}",
                name, current, clamped
            ));
            *value = clamped;
        }
    }

    let errors = consistency_errors(&context.financial_metrics.performance);

    let completeness = context.data_quality.completeness.overall;
    if completeness < MIN_USABLE_COMPLETENESS {
        warnings.push(format!(
            "Data completeness of {:.1}% is low; analysis confidence will be reduced",
            completeness
        ));
    }

    if !warnings.is_empty() || !errors.is_empty() {
        warn!(
            warnings = warnings.len(),
            errors = errors.len(),
            "Context validation found issues"
        );
    }

    ValidatedContext {
        context,
        warnings,
        errors,
    }
}
