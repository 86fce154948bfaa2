use valuation_core::stats::{clamp_score, mean};

use crate::input::{section_completeness, ProfessionalTierData};
use crate::types::{Completeness, DataQuality, ProcessedFinancialMetrics};

const FINANCIAL_COMPLETENESS_WEIGHT: f64 = 0.4;
const OTHER_COMPLETENESS_WEIGHT: f64 = 0.15;
const ACCURACY_PENALTY: f64 = 10.0;

// No freshness metadata is collected yet, so timeliness is a fixed score.
fn timeliness_score() -> f64 {
    85.0
}

pub fn calculate_completeness(data: &ProfessionalTierData) -> Completeness {
    let financial = section_completeness(data.financial_performance.as_ref());
    let operational = section_completeness(data.operations.as_ref());
    let strategic = section_completeness(data.strategy.as_ref());
    let market = section_completeness(data.market.as_ref());
    let risk = section_completeness(data.risk.as_ref());

    let overall = financial * FINANCIAL_COMPLETENESS_WEIGHT
        + (operational + strategic + market + risk) * OTHER_COMPLETENESS_WEIGHT;

    Completeness {
        overall: clamp_score(overall, 0.0, 100.0),
        financial,
        operational,
        strategic,
        market,
        risk,
    }
}

/// Internal consistency checks on the resolved figures; each failure is one issue.
fn consistency_issues(data: &ProfessionalTierData, financial: &ProcessedFinancialMetrics) -> Vec<String> {
    let p = &financial.performance;
    let mut issues = Vec::new();

    if p.profitability.gross.amount > p.revenue.current && p.revenue.current > 0.0 {
        issues.push("Gross profit exceeds revenue".to_string());
    }
    if p.profitability.operating.amount > p.profitability.gross.amount {
        issues.push("Operating income exceeds gross profit".to_string());
    }
    if p.profitability.net.amount > p.revenue.current && p.revenue.current > 0.0 {
        issues.push("Net income exceeds revenue".to_string());
    }
    if let Some(fin) = data.financial_performance.as_ref() {
        if let (Some(current), Some(total)) = (fin.current_assets, fin.total_assets) {
            if current > total {
                issues.push("Current assets exceed total assets".to_string());
            }
        }
        if fin.total_liabilities.is_some_and(|l| l < 0.0) {
            issues.push("Total liabilities are negative".to_string());
        }
    }
    if let Some(ops) = data.operations.as_ref() {
        if ops.customer_retention_rate.is_some_and(|r| !(0.0..=100.0).contains(&r)) {
            issues.push("Customer retention rate outside 0-100%".to_string());
        }
        if ops.capacity_utilization.is_some_and(|c| !(0.0..=100.0).contains(&c)) {
            issues.push("Capacity utilization outside 0-100%".to_string());
        }
    }

    issues
}

pub fn build_data_quality(data: &ProfessionalTierData, financial: &ProcessedFinancialMetrics) -> DataQuality {
    let completeness = calculate_completeness(data);
    let mut issues = consistency_issues(data, financial);
    let accuracy = clamp_score(100.0 - issues.len() as f64 * ACCURACY_PENALTY, 0.0, 100.0);
    issues.extend(
        data.rejected_fields
            .iter()
            .map(|field| format!("Unreadable value for {}; default used", field)),
    );
    let timeliness = timeliness_score();
    let overall_score = clamp_score(mean(&[completeness.overall, accuracy, timeliness]), 0.0, 100.0);

    DataQuality {
        completeness,
        accuracy,
        timeliness,
        overall_score,
        issues,
        defaulted_fields: financial.defaulted_fields.clone(),
        rejected_fields: data.rejected_fields.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financial::build_financial_metrics;
    use crate::input::{FinancialPerformanceData, OperationsData};

    #[test]
    fn test_empty_input_has_zero_completeness() {
        let data = ProfessionalTierData::default();
        let quality = build_data_quality(&data, &build_financial_metrics(&data));
        assert_eq!(quality.completeness.overall, 0.0);
        assert_eq!(quality.accuracy, 100.0);
        assert!((quality.overall_score - (0.0 + 100.0 + 85.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_inconsistent_figures_lower_accuracy() {
        let data = ProfessionalTierData {
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(1_000_000.0),
                gross_profit: Some(2_000_000.0),
                ..Default::default()
            }),
            operations: Some(OperationsData {
                customer_retention_rate: Some(140.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let quality = build_data_quality(&data, &build_financial_metrics(&data));
        assert_eq!(quality.issues.len(), 2);
        assert_eq!(quality.accuracy, 80.0);
    }

    #[test]
    fn test_defaulted_and_rejected_fields_are_reported() {
        let data: ProfessionalTierData = serde_json::from_str(
            r#"{ "financialPerformance": { "annualRevenue": "5,000,000", "netIncome": "n/a" } }"#,
        )
        .unwrap();
        let financial = build_financial_metrics(&data);
        let quality = build_data_quality(&data, &financial);

        assert_eq!(quality.rejected_fields, vec!["financialPerformance.netIncome".to_string()]);
        assert!(quality.defaulted_fields.contains(&"grossProfit".to_string()));
        assert_eq!(quality.defaulted_fields, financial.defaulted_fields);
        assert!(quality
            .issues
            .contains(&"Unreadable value for financialPerformance.netIncome; default used".to_string()));
        // unreadable values are missing data, not inconsistent data
        assert_eq!(quality.accuracy, 100.0);
    }

    #[test]
    fn test_financial_weighting() {
        let data = ProfessionalTierData {
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(1.0),
                gross_profit: Some(1.0),
                operating_income: Some(1.0),
                net_income: Some(1.0),
                operating_cash_flow: Some(1.0),
                capital_expenditures: Some(1.0),
                total_assets: Some(1.0),
                total_liabilities: Some(1.0),
                current_assets: Some(1.0),
                current_liabilities: Some(1.0),
                cash: Some(1.0),
                historical_revenue: vec![1.0],
                ..Default::default()
            }),
            ..Default::default()
        };
        let completeness = calculate_completeness(&data);
        assert_eq!(completeness.financial, 100.0);
        assert!((completeness.overall - 40.0).abs() < 1e-9);
    }
}
