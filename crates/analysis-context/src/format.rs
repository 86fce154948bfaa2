//! Render an [`AnalysisContext`] as prompt text.

use valuation_core::display::{format_count, format_currency, format_percent, format_ratio};

use crate::types::{AnalysisContext, EnrichedInsights, TrendAnalysis};

pub const SECTION_HEADERS: [&str; 9] = [
    "BUSINESS PROFILE",
    "FINANCIAL PERFORMANCE",
    "OPERATIONAL PERFORMANCE",
    "STRATEGIC POSITION",
    "MARKET ENVIRONMENT",
    "RISK PROFILE",
    "BENCHMARK PERFORMANCE",
    "DATA QUALITY ASSESSMENT",
    "ENRICHED INSIGHTS",
];

fn header(title: &str) -> String {
    format!("=== {} ===", title)
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None reported".to_string()
    } else {
        items.join(", ")
    }
}

fn trend_line(label: &str, trend: &TrendAnalysis) -> String {
    format!(
        "- {} Trend: {} (strength {}, consistency {})",
        label,
        trend.direction.as_str(),
        format_percent(trend.strength * 100.0),
        format_percent(trend.consistency)
    )
}

fn business_profile(ctx: &AnalysisContext) -> Vec<String> {
    let p = &ctx.business_profile;
    let mut lines = vec![header(SECTION_HEADERS[0])];
    if let Some(name) = &p.name {
        lines.push(format!("- Company: {}", name));
    }
    lines.push(format!("- Industry: {}", p.industry));
    lines.push(format!("- Size: {}", p.size.as_str()));
    lines.push(format!("- Stage: {}", p.stage.as_str()));
    lines.push(format!("- Business Model: {}", p.business_model));
    lines.push(format!("- Geography: {}", list_or_none(&p.geography)));
    lines.push(format!("- Competitive Position: {}", p.competitive_position.as_str()));
    lines.push(format!("- Years in Business: {:.0}", p.years_in_business));
    if let Some(employees) = p.employee_count {
        lines.push(format!("- Employees: {}", format_count(employees as f64)));
    }
    lines
}

fn financial_performance(ctx: &AnalysisContext) -> Vec<String> {
    let fm = &ctx.financial_metrics;
    let p = &fm.performance;
    let mut lines = vec![
        header(SECTION_HEADERS[1]),
        format!("- Revenue: {}", format_currency(p.revenue.current)),
        format!("- Revenue Growth: {}", format_percent(p.revenue.growth_rate)),
        format!(
            "- Gross Profit: {} ({} margin)",
            format_currency(p.profitability.gross.amount),
            format_percent(p.profitability.gross.margin)
        ),
        format!(
            "- Operating Income: {} ({} margin)",
            format_currency(p.profitability.operating.amount),
            format_percent(p.profitability.operating.margin)
        ),
        format!(
            "- Net Income: {} ({} margin)",
            format_currency(p.profitability.net.amount),
            format_percent(p.profitability.net.margin)
        ),
        format!(
            "- EBITDA: {} ({} margin)",
            format_currency(p.profitability.ebitda.amount),
            format_percent(p.profitability.ebitda.margin)
        ),
        format!("- Free Cash Flow: {}", format_currency(p.cash_flow.free_cash_flow)),
        format!("- Current Ratio: {}", format_ratio(p.liquidity.current_ratio)),
        format!("- Debt to Equity: {}", format_ratio(p.leverage.debt_to_equity)),
        format!("- Asset Turnover: {}", format_ratio(p.efficiency.asset_turnover)),
        trend_line("Revenue", &fm.trends.revenue),
    ];

    if let Some(capital) = &p.leverage.capital_structure {
        lines.push(format!(
            "- Capital Structure: WACC {}, credit rating {}, equity {}",
            format_percent(capital.wacc),
            capital.credit_rating,
            format_currency(capital.equity_value)
        ));
    }
    if let Some(projections) = &fm.projections {
        for scenario in &projections.scenarios {
            if let Some(last) = scenario.projected_revenue.last() {
                lines.push(format!(
                    "- Scenario {}: {} growth, {} revenue in year {} (p={:.2})",
                    scenario.name,
                    format_percent(scenario.growth_rate),
                    format_currency(*last),
                    scenario.projected_revenue.len(),
                    scenario.probability
                ));
            }
        }
        if projections.scenarios.is_empty() {
            if let Some(year) = projections.years.last() {
                lines.push(format!(
                    "- Projected Revenue (year {}): {}",
                    year.year_offset,
                    format_currency(year.revenue)
                ));
            }
        }
    }
    if let Some(valuation) = &fm.valuation {
        lines.push(format!(
            "- Revenue Multiple Valuation: {} - {}",
            format_currency(valuation.revenue_multiple.low),
            format_currency(valuation.revenue_multiple.high)
        ));
        lines.push(format!(
            "- EBITDA Multiple Valuation: {} - {}",
            format_currency(valuation.ebitda_multiple.low),
            format_currency(valuation.ebitda_multiple.high)
        ));
        if let Some(dcf) = &valuation.dcf {
            lines.push(format!(
                "- DCF Equity Value: {} - {} (discount rate {})",
                format_currency(dcf.equity_value.low),
                format_currency(dcf.equity_value.high),
                format_percent(dcf.discount_rate)
            ));
        }
    }
    lines
}

fn operational_performance(ctx: &AnalysisContext) -> Vec<String> {
    let o = &ctx.operational_metrics;
    let mut lines = vec![
        header(SECTION_HEADERS[2]),
        format!("- Overall Efficiency: {}", format_percent(o.efficiency.overall)),
        format!(
            "- Revenue per Employee: {}",
            format_currency(o.efficiency.revenue_per_employee)
        ),
        format!(
            "- Capacity Utilization: {}",
            format_percent(o.efficiency.capacity_utilization)
        ),
        format!("- Customer Retention: {}", format_percent(o.customer.retention_rate)),
    ];
    if let Some(count) = o.customer.count {
        lines.push(format!("- Customers: {}", format_count(count)));
    }
    if let Some(ratio) = o.customer.ltv_to_cac {
        lines.push(format!("- LTV/CAC: {}", format_ratio(ratio)));
    }
    lines.push(format!("- Scalability Score: {:.0}/100", o.scalability_score));
    lines.push(format!("- Process Maturity: {:.0}/100", o.process_maturity));
    lines.push(format!("- Technology Adoption: {:.0}/100", o.technology_adoption));
    lines.push(format!(
        "- Key Person Dependency: {}",
        if o.key_person_dependency { "yes" } else { "no" }
    ));
    lines
}

fn strategic_position(ctx: &AnalysisContext) -> Vec<String> {
    let s = &ctx.strategic_context;
    let mut lines = vec![
        header(SECTION_HEADERS[3]),
        format!("- Competitive Advantages: {}", list_or_none(&s.competitive_advantages)),
        format!("- Moat Strength: {:.0}/100", s.moat_strength),
        format!("- Growth Strategies: {}", list_or_none(&s.growth_strategies)),
        format!("- Strategic Priorities: {}", list_or_none(&s.strategic_priorities)),
        format!("- Innovation Investment: {}", format_percent(s.innovation_investment)),
        format!("- Partnerships: {}", list_or_none(&s.partnerships)),
    ];
    if let Some(drivers) = &s.value_drivers {
        lines.push(format!(
            "- Value Drivers: score {:.0}/100, brand {:.0}/100, recurring revenue {}",
            drivers.driver_score,
            drivers.brand_strength,
            format_percent(drivers.recurring_revenue_percent)
        ));
        lines.push(format!(
            "- Intellectual Property: {}",
            list_or_none(&drivers.intellectual_property)
        ));
    }
    lines
}

fn market_environment(ctx: &AnalysisContext) -> Vec<String> {
    let m = &ctx.market_context;
    let mut lines = vec![header(SECTION_HEADERS[4])];
    if let Some(size) = m.market_size {
        lines.push(format!("- Market Size: {}", format_currency(size)));
    }
    lines.push(format!("- Market Growth: {}", format_percent(m.growth_rate)));
    if let Some(share) = m.market_share {
        lines.push(format!("- Market Share: {}", format_percent(share)));
    }
    if let Some(count) = m.competitor_count {
        lines.push(format!("- Competitors: {}", count));
    }
    lines.push(format!("- Competitive Intensity: {}", m.competitive_intensity.as_str()));
    lines.push(format!("- Regulatory Environment: {}", m.regulatory_environment.as_str()));
    lines.push(format!("- Market Trends: {}", list_or_none(&m.trends)));
    lines
}

fn risk_profile(ctx: &AnalysisContext) -> Vec<String> {
    let r = &ctx.risk_profile;
    vec![
        header(SECTION_HEADERS[5]),
        format!("- Overall Risk: {:.0}/100 ({})", r.overall_score, r.level.as_str()),
        format!(
            "- Category Scores: financial {:.0}, operational {:.0}, market {:.0}, regulatory {:.0}",
            r.categories.financial, r.categories.operational, r.categories.market, r.categories.regulatory
        ),
        format!("- Key Risks: {}", list_or_none(&r.key_risks)),
        format!("- Risk Tolerance: {}", r.risk_tolerance.as_str()),
    ]
}

fn benchmark_performance(ctx: &AnalysisContext) -> Vec<String> {
    let b = &ctx.benchmark_comparisons;
    let mut lines = vec![
        header(SECTION_HEADERS[6]),
        format!("- Industry Benchmark: {}", b.industry),
    ];
    for m in &b.metrics {
        lines.push(format!(
            "- {}: {:.2} vs industry {:.2} ({})",
            m.metric,
            m.company_value,
            m.industry_value,
            m.position.as_str()
        ));
    }
    lines.push(format!("- Estimated Percentile: {:.0}", b.overall_percentile));
    lines
}

fn data_quality(ctx: &AnalysisContext) -> Vec<String> {
    let q = &ctx.data_quality;
    let mut lines = vec![
        header(SECTION_HEADERS[7]),
        format!("- Overall Quality: {}", format_percent(q.overall_score)),
        format!("- Completeness: {}", format_percent(q.completeness.overall)),
        format!("- Accuracy: {}", format_percent(q.accuracy)),
        format!("- Timeliness: {}", format_percent(q.timeliness)),
    ];
    if !q.issues.is_empty() {
        lines.push(format!("- Issues: {}", q.issues.join("; ")));
    }
    lines
}

fn insight_lines(insights: &EnrichedInsights) -> Vec<String> {
    [
        ("Strengths", &insights.strengths),
        ("Concerns", &insights.concerns),
        ("Opportunities", &insights.opportunities),
        ("Red Flags", &insights.red_flags),
        ("Value Drivers", &insights.value_drivers),
    ]
    .into_iter()
    .map(|(label, items)| format!("- {}: {}", label, list_or_none(items)))
    .collect()
}

fn enriched_insights(ctx: &AnalysisContext) -> Vec<String> {
    let mut lines = vec![header(SECTION_HEADERS[8])];
    lines.extend(insight_lines(&ctx.enriched_insights));
    if let Some(focus) = &ctx.focus {
        for d in &focus.derived {
            lines.push(format!("- [{}] {}: {}", d.area.as_str(), d.label, d.value));
        }
    }
    lines
}

/// Render all nine sections in a fixed order, separated by blank lines.
pub fn format_context_for_prompt(ctx: &AnalysisContext) -> String {
    [
        business_profile(ctx),
        financial_performance(ctx),
        operational_performance(ctx),
        strategic_position(ctx),
        market_environment(ctx),
        risk_profile(ctx),
        benchmark_performance(ctx),
        data_quality(ctx),
        enriched_insights(ctx),
    ]
    .into_iter()
    .map(|section| section.join("\n"))
    .collect::<Vec<_>>()
    .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_enterprise_context, build_professional_context};
    use crate::input::{EnterpriseTierData, FinancialPerformanceData, ProfessionalTierData};

    #[test]
    fn test_headers_in_order() {
        let text = format_context_for_prompt(&build_professional_context(&ProfessionalTierData::default()));
        let mut last = 0;
        for h in SECTION_HEADERS {
            let idx = text.find(&format!("=== {} ===", h)).expect("header present");
            assert!(idx >= last);
            last = idx;
        }
    }

    #[test]
    fn test_currency_and_percent_formatting() {
        let data = ProfessionalTierData {
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(15_000_000.0),
                gross_profit: Some(11_250_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = format_context_for_prompt(&build_professional_context(&data));
        assert!(text.contains("- Revenue: $15,000,000"));
        assert!(text.contains("$11,250,000 (75.0% margin)"));
    }

    #[test]
    fn test_enterprise_lines_present() {
        let text = format_context_for_prompt(&build_enterprise_context(&EnterpriseTierData::default()));
        assert!(text.contains("- Capital Structure: WACC 10.0%"));
        assert!(text.contains("- Scenario base:"));
        assert_eq!(text, text.trim());
    }
}
