use std::collections::HashMap;

use analysis_context::{priority_weights, PriorityWeights};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use valuation_core::{AnalysisType, Tier, ValuationError, ValuationResult};

use crate::schema::{enterprise_schema, professional_schema};

/// A worked input/output pair shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub input: String,
    pub output: Value,
}

/// Immutable prompt configuration for one tier and analysis type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    pub role: String,
    pub objective: String,
    pub weights: PriorityWeights,
    pub reasoning_steps: Vec<String>,
    pub examples: Vec<FewShotExample>,
    pub output_schema: Value,
}

fn focus_step(analysis_type: AnalysisType) -> &'static str {
    match analysis_type {
        AnalysisType::Comprehensive => "Synthesize operational, strategic and market positioning into an overall view",
        AnalysisType::Valuation => "Triangulate value from revenue multiples, EBITDA multiples and cash generation",
        AnalysisType::FinancialAnalysis => "Diagnose the drivers behind margins, cash conversion and working capital",
        AnalysisType::RiskAssessment => "Rank each risk category by likelihood and impact on value",
        AnalysisType::StrategicPlanning => "Match growth strategies to competitive advantages and market trends",
        AnalysisType::MarketAnalysis => "Size the addressable opportunity and the company's share of it",
        AnalysisType::OperationalAnalysis => "Locate capacity, process and key-person constraints on scaling",
        AnalysisType::CompetitiveAnalysis => "Compare the moat and positioning against the competitive set",
    }
}

fn reasoning_steps(tier: Tier, analysis_type: AnalysisType) -> Vec<String> {
    let mut steps = vec![
        "Review the business profile and data quality to calibrate confidence",
        "Assess financial performance: profitability, liquidity, leverage and trends",
        focus_step(analysis_type),
    ];
    if tier == Tier::Enterprise {
        steps.push("Evaluate the capital structure, cost of capital and DCF-implied equity value");
        steps.push("Stress-test conclusions across the base, optimistic and pessimistic scenarios");
    }
    steps.push("Weigh risks and benchmark gaps against the strengths identified");
    steps.push("Formulate prioritized recommendations with owners and timelines");
    steps.into_iter().map(String::from).collect()
}

fn professional_example() -> FewShotExample {
    FewShotExample {
        input: "Regional HVAC services firm, $8.2M revenue, 38% gross margin, 11% growth, retention 88%, \
                two customers above 20% of revenue"
            .to_string(),
        output: json!({
            "executive_summary": "Profitable, steadily growing services business held back by customer concentration.",
            "valuation": { "low": 6_600_000, "mid": 9_800_000, "high": 14_700_000, "methodology": "Revenue and EBITDA multiples" },
            "financial_health": { "score": 72, "assessment": "Healthy margins with adequate liquidity" },
            "key_findings": ["Gross margin above industry median", "Two customers exceed 20% of revenue each"],
            "recommendations": [
                { "action": "Diversify the commercial customer base", "priority": "high", "timeline": "12 months" },
                { "action": "Introduce annual maintenance contracts", "priority": "medium", "timeline": "6 months" },
                { "action": "Document dispatch and quoting processes", "priority": "low", "timeline": "3 months" }
            ],
            "risks": [
                { "risk": "Customer concentration", "severity": "high", "mitigation": "Target 15 new mid-size accounts" },
                { "risk": "Technician shortage", "severity": "medium", "mitigation": "Apprenticeship program" }
            ],
            "confidence": 0.74
        }),
    }
}

fn enterprise_examples() -> Vec<FewShotExample> {
    let mut saas = professional_example();
    saas.input = "B2B SaaS platform, $42M ARR, 78% gross margin, 31% growth, net retention 112%, WACC 11%".to_string();
    saas.output = json!({
        "executive_summary": "High-growth SaaS platform with strong unit economics and expansion revenue.",
        "valuation": { "low": 168_000_000, "mid": 210_000_000, "high": 262_000_000, "methodology": "DCF cross-checked with revenue multiples" },
        "financial_health": { "score": 81, "assessment": "Strong margins, burn funded by existing cash" },
        "key_findings": ["Net retention above 110%", "CAC payback under 18 months"],
        "recommendations": [
            { "action": "Expand enterprise sales coverage in Europe", "priority": "high", "timeline": "2 quarters" },
            { "action": "Add usage-based pricing tier", "priority": "high", "timeline": "1 quarter" },
            { "action": "Refinance convertible notes", "priority": "medium", "timeline": "9 months" },
            { "action": "Consolidate data infrastructure vendors", "priority": "medium", "timeline": "6 months" },
            { "action": "Formalize board-level security reporting", "priority": "low", "timeline": "3 months" }
        ],
        "risks": [
            { "risk": "Competitive pricing pressure", "severity": "medium", "mitigation": "Differentiate on integrations" },
            { "risk": "Key engineering leadership retention", "severity": "medium", "mitigation": "Refresh equity grants" }
        ],
        "confidence": 0.78,
        "scenario_analysis": [
            { "scenario": "base", "probability": 0.5, "valuation": { "low": 190_000_000, "high": 230_000_000 } },
            { "scenario": "optimistic", "probability": 0.25, "valuation": { "low": 240_000_000, "high": 290_000_000 } },
            { "scenario": "pessimistic", "probability": 0.25, "valuation": { "low": 140_000_000, "high": 175_000_000 } }
        ],
        "strategic_options": ["Tuck-in acquisition of analytics vendor", "Strategic minority investment"],
        "capital_structure_assessment": { "optimal_debt_to_equity": 0.3, "commentary": "Room for modest term debt" }
    });

    let manufacturer = FewShotExample {
        input: "Specialty packaging manufacturer, $185M revenue, 24% gross margin, -3% growth, debt/equity 1.8, \
                two plants above 90% utilization"
            .to_string(),
        output: json!({
            "executive_summary": "Mature manufacturer with capacity constraints and elevated leverage in a flat market.",
            "valuation": { "low": 150_000_000, "mid": 185_000_000, "high": 220_000_000, "methodology": "EBITDA multiples and DCF" },
            "financial_health": { "score": 58, "assessment": "Adequate coverage but limited headroom" },
            "key_findings": ["Revenue contracting for two years", "Plants near capacity limit"],
            "recommendations": [
                { "action": "Reprice low-margin contracts", "priority": "high", "timeline": "6 months" },
                { "action": "Debottleneck the primary plant", "priority": "high", "timeline": "12 months" },
                { "action": "Divest non-core film line", "priority": "medium", "timeline": "18 months" },
                { "action": "Extend revolver maturity", "priority": "medium", "timeline": "6 months" },
                { "action": "Pilot recyclable product range", "priority": "low", "timeline": "12 months" }
            ],
            "risks": [
                { "risk": "Resin price volatility", "severity": "high", "mitigation": "Index-linked pricing" },
                { "risk": "Covenant pressure", "severity": "medium", "mitigation": "Deleverage with divestment proceeds" }
            ],
            "confidence": 0.66,
            "scenario_analysis": [
                { "scenario": "base", "probability": 0.5 },
                { "scenario": "optimistic", "probability": 0.25 },
                { "scenario": "pessimistic", "probability": 0.25 }
            ],
            "strategic_options": ["Divest non-core assets", "Merge with regional competitor"],
            "capital_structure_assessment": { "optimal_debt_to_equity": 1.0, "commentary": "Deleverage before expansion capex" }
        }),
    };

    vec![saas, manufacturer]
}

fn build_template(tier: Tier, analysis_type: AnalysisType) -> PromptTemplate {
    let (role, examples, output_schema) = match tier {
        Tier::Enterprise => (
            "You are a valuation partner advising executive leadership and boards. \
             Your analysis must be rigorous, scenario-aware and decision-ready.",
            enterprise_examples(),
            enterprise_schema(),
        ),
        _ => (
            "You are a senior business analyst advising owners of small and mid-sized companies. \
             Your analysis must be practical, evidence-based and clearly prioritized.",
            vec![professional_example()],
            professional_schema(),
        ),
    };

    PromptTemplate {
        tier,
        analysis_type,
        role: role.to_string(),
        objective: format!(
            "Produce a {} grounded in the business context below.",
            analysis_type.label().to_lowercase()
        ),
        weights: priority_weights(tier, analysis_type),
        reasoning_steps: reasoning_steps(tier, analysis_type),
        examples,
        output_schema,
    }
}

lazy_static! {
    static ref CATALOG: HashMap<(Tier, AnalysisType), PromptTemplate> = {
        [Tier::Professional, Tier::Enterprise]
            .into_iter()
            .flat_map(|tier| AnalysisType::all().into_iter().map(move |t| (tier, t)))
            .map(|key| (key, build_template(key.0, key.1)))
            .collect()
    };
}

/// Template for a tier and analysis type. The consumer tier has none.
pub fn template(tier: Tier, analysis_type: AnalysisType) -> ValuationResult<&'static PromptTemplate> {
    CATALOG
        .get(&(tier, analysis_type))
        .ok_or_else(|| ValuationError::UnsupportedTier(format!("no {} template for tier {}", analysis_type, tier)))
}

pub fn catalog_size() -> usize {
    CATALOG.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::required_fields;

    #[test]
    fn test_catalog_covers_paid_tiers() {
        assert_eq!(catalog_size(), 16);
        for t in AnalysisType::all() {
            assert!(template(Tier::Professional, t).is_ok());
            assert!(template(Tier::Enterprise, t).is_ok());
            assert!(matches!(
                template(Tier::Consumer, t),
                Err(ValuationError::UnsupportedTier(_))
            ));
        }
    }

    #[test]
    fn test_reasoning_and_example_counts() {
        let pro = template(Tier::Professional, AnalysisType::Valuation).unwrap();
        let ent = template(Tier::Enterprise, AnalysisType::Valuation).unwrap();
        assert_eq!(pro.reasoning_steps.len(), 5);
        assert_eq!(ent.reasoning_steps.len(), 7);
        assert_eq!(pro.examples.len(), 1);
        assert_eq!(ent.examples.len(), 2);
    }

    #[test]
    fn test_examples_satisfy_their_schema() {
        for tier in [Tier::Professional, Tier::Enterprise] {
            let tpl = template(tier, AnalysisType::Comprehensive).unwrap();
            let required = required_fields(&tpl.output_schema);
            for example in &tpl.examples {
                for field in &required {
                    assert!(example.output.get(field).is_some(), "{} missing {}", tier, field);
                }
            }
        }
    }

    #[test]
    fn test_weights_match_context_prioritization() {
        let tpl = template(Tier::Enterprise, AnalysisType::RiskAssessment).unwrap();
        assert_eq!(tpl.weights, priority_weights(Tier::Enterprise, AnalysisType::RiskAssessment));
    }
}
