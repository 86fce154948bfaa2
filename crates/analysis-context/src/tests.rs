#[cfg(test)]
mod context_scenario_tests {
    use valuation_core::{AnalysisType, BusinessSize, Tier};

    use crate::input::*;
    use crate::types::TrendDirection;
    use crate::{
        analyze_trend, build_enterprise_context, build_professional_context, determine_business_size,
        format_context_for_prompt, prioritize_context_data, validate_and_sanitize_context,
        SECTION_HEADERS,
    };

    fn mock_professional_data() -> ProfessionalTierData {
        ProfessionalTierData {
            business_info: Some(BusinessInfo {
                business_name: Some("Acme Analytics".to_string()),
                industry: Some("Software".to_string()),
                business_model: Some("saas".to_string()),
                years_in_business: Some(8.0),
                employee_count: Some(120),
                geographic_markets: vec!["North America".to_string(), "Europe".to_string()],
                competitive_position: None,
            }),
            financial_performance: Some(FinancialPerformanceData {
                annual_revenue: Some(15_000_000.0),
                gross_profit: Some(11_250_000.0),
                operating_income: Some(2_250_000.0),
                net_income: Some(1_500_000.0),
                total_assets: Some(12_000_000.0),
                total_liabilities: Some(4_000_000.0),
                current_assets: Some(6_000_000.0),
                current_liabilities: Some(2_500_000.0),
                cash: Some(2_000_000.0),
                historical_revenue: vec![10_000_000.0, 12_000_000.0, 15_000_000.0],
                historical_net_income: vec![800_000.0, 1_100_000.0, 1_500_000.0],
                ..Default::default()
            }),
            operations: Some(OperationsData {
                customer_count: Some(450.0),
                customer_retention_rate: Some(92.0),
                customer_acquisition_cost: Some(4_000.0),
                customer_lifetime_value: Some(20_000.0),
                capacity_utilization: Some(80.0),
                process_documentation: Some(70.0),
                technology_adoption: Some(85.0),
                key_person_dependency: Some(false),
            }),
            strategy: Some(StrategyData {
                competitive_advantages: vec!["Proprietary data".to_string(), "Integrations".to_string()],
                growth_strategies: vec!["International expansion".to_string()],
                strategic_priorities: vec!["Enterprise sales".to_string()],
                innovation_investment: Some(12.0),
                partnerships: vec![],
            }),
            market: Some(MarketData {
                market_size: Some(2_000_000_000.0),
                market_growth_rate: Some(14.0),
                market_share: Some(0.75),
                competitor_count: Some(25),
                market_trends: vec!["AI adoption".to_string()],
                regulatory_environment: Some(RegulatoryEnvironment::Moderate),
            }),
            risk: Some(RiskData {
                key_risks: vec!["Talent retention".to_string()],
                customer_concentration: Some(12.0),
                supplier_concentration: None,
                risk_tolerance: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_gross_margin_scenario() {
        let ctx = build_professional_context(&mock_professional_data());
        let margin = ctx.financial_metrics.performance.profitability.gross.margin;
        assert!((margin - 75.0).abs() <= 0.1);
    }

    #[test]
    fn test_enterprise_is_superset_of_professional() {
        let professional = mock_professional_data();
        let enterprise = EnterpriseTierData {
            professional: professional.clone(),
            capital_structure: Some(CapitalStructureData {
                weighted_average_cost_of_capital: Some(11.0),
                credit_rating: Some("BBB".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let pro_ctx = build_professional_context(&professional);
        let ent_ctx = build_enterprise_context(&enterprise);

        let mut ent_perf = ent_ctx.financial_metrics.performance.clone();
        assert!(ent_perf.leverage.capital_structure.take().is_some());
        assert_eq!(ent_perf, pro_ctx.financial_metrics.performance);

        assert_eq!(ent_ctx.business_profile, pro_ctx.business_profile);
        assert_eq!(ent_ctx.operational_metrics, pro_ctx.operational_metrics);
        assert_eq!(ent_ctx.market_context, pro_ctx.market_context);
        assert_eq!(ent_ctx.risk_profile, pro_ctx.risk_profile);
        assert_eq!(ent_ctx.benchmark_comparisons, pro_ctx.benchmark_comparisons);
        assert_eq!(ent_ctx.data_quality, pro_ctx.data_quality);
        assert_eq!(ent_ctx.financial_metrics.trends, pro_ctx.financial_metrics.trends);

        let pro_valuation = pro_ctx.financial_metrics.valuation.unwrap();
        let ent_valuation = ent_ctx.financial_metrics.valuation.unwrap();
        assert_eq!(ent_valuation.revenue_multiple, pro_valuation.revenue_multiple);
        assert!(ent_valuation.dcf.is_some());
    }

    #[test]
    fn test_size_bucket_boundaries() {
        assert_eq!(determine_business_size(9_999_999.0), BusinessSize::Small);
        assert_eq!(determine_business_size(10_000_000.0), BusinessSize::Medium);
        assert_eq!(determine_business_size(99_999_999.0), BusinessSize::Medium);
        assert_eq!(determine_business_size(100_000_000.0), BusinessSize::Large);
    }

    #[test]
    fn test_trend_direction_law() {
        assert_eq!(
            analyze_trend(&[10_000_000.0, 12_000_000.0, 15_000_000.0], 3).direction,
            TrendDirection::Improving
        );
        assert_eq!(
            analyze_trend(&[15_000_000.0, 12_000_000.0, 9_000_000.0], 3).direction,
            TrendDirection::Declining
        );
        assert_eq!(
            analyze_trend(&[10_000_000.0, 10_500_000.0, 10_400_000.0], 3).direction,
            TrendDirection::Stable
        );
    }

    #[test]
    fn test_formatted_context_has_all_headers_for_both_tiers() {
        let data = mock_professional_data();
        let contexts = [
            build_professional_context(&data),
            build_enterprise_context(&EnterpriseTierData {
                professional: data.clone(),
                ..Default::default()
            }),
            build_professional_context(&ProfessionalTierData::default()),
        ];
        for ctx in &contexts {
            let text = format_context_for_prompt(ctx);
            for h in SECTION_HEADERS {
                assert!(text.contains(&format!("=== {} ===", h)), "missing {}", h);
            }
            assert_eq!(text, format_context_for_prompt(ctx));
        }
    }

    #[test]
    fn test_complete_data_keeps_projections_when_prioritized() {
        let ctx = build_professional_context(&mock_professional_data());
        assert!(ctx.data_quality.completeness.overall >= 70.0);
        let prioritized = prioritize_context_data(&ctx, AnalysisType::Valuation);
        assert!(prioritized.financial_metrics.projections.is_some());
        let focus = prioritized.focus.as_ref().unwrap();
        assert!(focus.filtered_fields.is_empty());
        assert!(!focus.derived.is_empty());
        assert_eq!(prioritized.tier, Tier::Professional);
    }

    #[test]
    fn test_mock_data_validates_cleanly() {
        let validated = validate_and_sanitize_context(&build_professional_context(&mock_professional_data()));
        assert!(validated.is_valid(), "{:?}", validated.errors);
    }

    #[test]
    fn test_partial_json_input_builds() {
        let data: ProfessionalTierData = serde_json::from_str(
            r#"{"financialPerformance": {"annualRevenue": 15000000, "grossProfit": 11250000}}"#,
        )
        .unwrap();
        let ctx = build_professional_context(&data);
        assert!((ctx.financial_metrics.performance.profitability.gross.margin - 75.0).abs() <= 0.1);
        assert!(ctx.data_quality.completeness.overall < 50.0);
    }
}
