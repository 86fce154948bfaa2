use valuation_core::stats::{clamp_score, safe_div};

use crate::input::ProfessionalTierData;
use crate::types::{CustomerMetrics, OperationalEfficiency, OperationalMetrics};

pub const DEFAULT_RETENTION_RATE: f64 = 80.0;
pub const DEFAULT_CAPACITY_UTILIZATION: f64 = 75.0;
const DEFAULT_PROCESS_DOCUMENTATION: f64 = 50.0;
const DEFAULT_TECHNOLOGY_ADOPTION: f64 = 50.0;

// Placeholder scores until efficiency and scalability get real models.
fn overall_efficiency() -> f64 {
    75.0
}

fn scalability_score() -> f64 {
    70.0
}

pub fn build_operational_metrics(data: &ProfessionalTierData) -> OperationalMetrics {
    let ops = data.operations.clone().unwrap_or_default();
    let revenue = data
        .financial_performance
        .as_ref()
        .and_then(|f| f.annual_revenue)
        .unwrap_or(0.0);
    let employees = data
        .business_info
        .as_ref()
        .and_then(|b| b.employee_count)
        .unwrap_or(1)
        .max(1);

    let ltv_to_cac = match (ops.customer_lifetime_value, ops.customer_acquisition_cost) {
        (Some(ltv), Some(cac)) if cac > 0.0 => Some(ltv / cac),
        _ => None,
    };

    OperationalMetrics {
        efficiency: OperationalEfficiency {
            overall: overall_efficiency(),
            revenue_per_employee: safe_div(revenue, employees as f64),
            capacity_utilization: ops
                .capacity_utilization
                .unwrap_or(DEFAULT_CAPACITY_UTILIZATION),
        },
        customer: CustomerMetrics {
            count: ops.customer_count,
            retention_rate: ops.customer_retention_rate.unwrap_or(DEFAULT_RETENTION_RATE),
            acquisition_cost: ops.customer_acquisition_cost,
            lifetime_value: ops.customer_lifetime_value,
            ltv_to_cac,
        },
        scalability_score: scalability_score(),
        process_maturity: clamp_score(
            ops.process_documentation.unwrap_or(DEFAULT_PROCESS_DOCUMENTATION),
            0.0,
            100.0,
        ),
        technology_adoption: clamp_score(
            ops.technology_adoption.unwrap_or(DEFAULT_TECHNOLOGY_ADOPTION),
            0.0,
            100.0,
        ),
        key_person_dependency: ops.key_person_dependency.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{BusinessInfo, FinancialPerformanceData, OperationsData};

    #[test]
    fn test_operational_defaults() {
        let ops = build_operational_metrics(&ProfessionalTierData::default());
        assert_eq!(ops.efficiency.overall, 75.0);
        assert_eq!(ops.scalability_score, 70.0);
        assert_eq!(ops.customer.retention_rate, DEFAULT_RETENTION_RATE);
        assert_eq!(ops.efficiency.revenue_per_employee, 0.0);
        assert!(ops.customer.ltv_to_cac.is_none());
    }

    #[test]
    fn test_ltv_to_cac_and_revenue_per_employee() {
        let data = ProfessionalTierData {
            business_info: Some(BusinessInfo {
                employee_count: Some(50),
                ..Default::default()
            }),
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(5_000_000.0),
                ..Default::default()
            }),
            operations: Some(OperationsData {
                customer_lifetime_value: Some(9_000.0),
                customer_acquisition_cost: Some(3_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let ops = build_operational_metrics(&data);
        assert_eq!(ops.customer.ltv_to_cac, Some(3.0));
        assert!((ops.efficiency.revenue_per_employee - 100_000.0).abs() < 1e-9);
    }
}
