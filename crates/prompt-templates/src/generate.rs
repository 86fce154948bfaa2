use analysis_context::{format_context_for_prompt, AnalysisContext};
use tracing::debug;
use valuation_core::{AnalysisType, Tier, ValuationError, ValuationResult};

use crate::catalog::template;
use crate::schema::{required_fields, schema_for};

/// Render the full template prompt for a context.
///
/// Sections are introduced by `Objective:`, `Context:`, `Requirements:`,
/// `Examples:` and `Output format:` lines so the structure optimizer can
/// split and budget them.
pub fn generate_prompt(tier: Tier, analysis_type: AnalysisType, context: &AnalysisContext) -> ValuationResult<String> {
    let tpl = template(tier, analysis_type)?;
    let business = context
        .business_profile
        .name
        .clone()
        .unwrap_or_else(|| "the business".to_string());

    let mut parts = vec![
        tpl.role.clone(),
        format!("Objective:\n{} The subject is {}.", tpl.objective, business),
        format!("Context:\n{}", format_context_for_prompt(context)),
    ];

    let mut requirements = vec!["Weight your analysis by these focus areas (0-1):".to_string()];
    requirements.extend(
        tpl.weights
            .entries()
            .iter()
            .map(|(area, weight)| format!("- {}: {:.2}", area.as_str(), weight)),
    );
    requirements.push("Reason through these steps in order:".to_string());
    requirements.extend(
        tpl.reasoning_steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step)),
    );
    parts.push(format!("Requirements:\n{}", requirements.join("\n")));

    let examples = tpl
        .examples
        .iter()
        .enumerate()
        .map(|(i, ex)| format!("Example {}\nInput: {}\nResponse: {}", i + 1, ex.input, ex.output))
        .collect::<Vec<_>>()
        .join("\n\n");
    parts.push(format!("Examples:\n{}", examples));

    parts.push(format!(
        "Output format:\nReturn a single JSON object conforming to this schema:\n{}\nRespond with the JSON object only.",
        tpl.output_schema
    ));

    let prompt = parts.join("\n\n");
    debug!(
        tier = tier.as_str(),
        analysis_type = analysis_type.as_str(),
        chars = prompt.len(),
        "Template prompt generated"
    );
    Ok(prompt)
}

/// Top-level fields the tier's output schema requires.
pub fn required_output_fields(tier: Tier) -> ValuationResult<Vec<String>> {
    schema_for(tier)
        .map(|schema| required_fields(&schema))
        .ok_or_else(|| ValuationError::UnsupportedTier(tier.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_context::{build_enterprise_context, build_professional_context, EnterpriseTierData, ProfessionalTierData, SECTION_HEADERS};

    #[test]
    fn test_prompt_contains_markers_and_context() {
        let ctx = build_professional_context(&ProfessionalTierData::default());
        let prompt = generate_prompt(Tier::Professional, AnalysisType::Valuation, &ctx).unwrap();
        for marker in ["\nObjective:\n", "\nContext:\n", "\nRequirements:\n", "\nExamples:\n", "\nOutput format:\n"] {
            assert!(prompt.contains(marker), "missing {:?}", marker);
        }
        for h in SECTION_HEADERS {
            assert!(prompt.contains(h));
        }
        assert!(prompt.contains("the business"));
        assert!(prompt.contains("\n5. "));
        assert!(!prompt.contains("\n6. "));
    }

    #[test]
    fn test_enterprise_prompt_has_seven_steps() {
        let ctx = build_enterprise_context(&EnterpriseTierData::default());
        let prompt = generate_prompt(Tier::Enterprise, AnalysisType::StrategicPlanning, &ctx).unwrap();
        assert!(prompt.contains("\n7. "));
        assert!(prompt.contains("Example 2"));
        assert!(prompt.contains("scenario_analysis"));
    }

    #[test]
    fn test_consumer_tier_is_rejected() {
        let ctx = build_professional_context(&ProfessionalTierData::default());
        assert!(generate_prompt(Tier::Consumer, AnalysisType::Valuation, &ctx).is_err());
        assert!(required_output_fields(Tier::Consumer).is_err());
        assert_eq!(required_output_fields(Tier::Professional).unwrap().len(), 7);
    }
}
