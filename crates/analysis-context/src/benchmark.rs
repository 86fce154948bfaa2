use valuation_core::stats::clamp_score;

use crate::types::{
    BenchmarkComparison, BenchmarkComparisons, BenchmarkPosition, BusinessProfile,
    ProcessedFinancialMetrics,
};

/// Industry medians used for comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndustryBenchmark {
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub revenue_growth: f64,
    pub current_ratio: f64,
}

/// Relative band inside which a metric counts as "at" the benchmark.
const AT_BENCHMARK_BAND: f64 = 0.05;

/// Map free-text industry names onto the benchmark table keys.
pub fn normalize_industry(industry: &str) -> &'static str {
    let i = industry.to_lowercase();
    if ["tech", "software", "saas", "it services", "internet"].iter().any(|k| i.contains(k)) {
        "technology"
    } else if ["manufactur", "industrial", "fabrication"].iter().any(|k| i.contains(k)) {
        "manufacturing"
    } else if ["retail", "e-commerce", "ecommerce", "consumer goods"].iter().any(|k| i.contains(k)) {
        "retail"
    } else if ["health", "medical", "pharma", "biotech"].iter().any(|k| i.contains(k)) {
        "healthcare"
    } else if ["consult", "professional", "services", "agency", "legal", "accounting"]
        .iter()
        .any(|k| i.contains(k))
    {
        "professional_services"
    } else {
        "general"
    }
}

pub fn industry_benchmark(industry_key: &str) -> IndustryBenchmark {
    let (gross_margin, operating_margin, revenue_growth, current_ratio) = match industry_key {
        "technology" => (65.0, 15.0, 20.0, 2.0),
        "manufacturing" => (30.0, 10.0, 5.0, 1.5),
        "retail" => (35.0, 6.0, 4.0, 1.2),
        "healthcare" => (45.0, 12.0, 8.0, 1.8),
        "professional_services" => (40.0, 14.0, 7.0, 1.6),
        _ => (40.0, 10.0, 6.0, 1.5),
    };
    IndustryBenchmark {
        gross_margin,
        operating_margin,
        revenue_growth,
        current_ratio,
    }
}

fn compare(metric: &str, company_value: f64, industry_value: f64) -> BenchmarkComparison {
    let variance = company_value - industry_value;
    let relative = if industry_value != 0.0 {
        variance.abs() / industry_value.abs()
    } else {
        variance.abs()
    };
    let position = if relative <= AT_BENCHMARK_BAND {
        BenchmarkPosition::At
    } else if variance > 0.0 {
        BenchmarkPosition::Above
    } else {
        BenchmarkPosition::Below
    };
    BenchmarkComparison {
        metric: metric.to_string(),
        company_value,
        industry_value,
        variance,
        position,
    }
}

pub fn build_benchmark_comparisons(
    profile: &BusinessProfile,
    financial: &ProcessedFinancialMetrics,
) -> BenchmarkComparisons {
    let key = normalize_industry(&profile.industry);
    let bench = industry_benchmark(key);
    let p = &financial.performance;

    let metrics = vec![
        compare("gross_margin", p.profitability.gross.margin, bench.gross_margin),
        compare("operating_margin", p.profitability.operating.margin, bench.operating_margin),
        compare("revenue_growth", p.revenue.growth_rate, bench.revenue_growth),
        compare("current_ratio", p.liquidity.current_ratio, bench.current_ratio),
    ];

    let above = metrics.iter().filter(|m| m.position == BenchmarkPosition::Above).count() as f64;
    let below = metrics.iter().filter(|m| m.position == BenchmarkPosition::Below).count() as f64;

    BenchmarkComparisons {
        industry: key.to_string(),
        metrics,
        overall_percentile: clamp_score(50.0 + 10.0 * (above - below), 0.0, 100.0),
    }
}
