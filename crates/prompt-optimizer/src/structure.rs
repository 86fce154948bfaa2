use lazy_static::lazy_static;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use valuation_core::{AnalysisType, Tier};

use crate::compressor::compress_prompt;
use crate::tokens::count_tokens;

lazy_static! {
    /// A heading line: optional `#` marks, a section keyword, then `:` or end of line.
    static ref SECTION_MARKER: Regex = {
        Regex::new(
            r"(?i)^\s*#*\s*(context|objective|requirement|constraint|example|output)s?(?:\s+format)?\s*(?::\s*(.*))?$",
        )
        .expect("section marker regex")
    };
}

/// Remaining budget below which a non-required section is dropped rather than squeezed.
const MIN_PARTIAL_TOKENS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Objective,
    Requirements,
    Context,
    Constraints,
    Output,
    Content,
    Examples,
}

impl SectionKind {
    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_lowercase().as_str() {
            "objective" => SectionKind::Objective,
            "requirement" => SectionKind::Requirements,
            "context" => SectionKind::Context,
            "constraint" => SectionKind::Constraints,
            "example" => SectionKind::Examples,
            "output" => SectionKind::Output,
            _ => SectionKind::Content,
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            SectionKind::Objective => 10,
            SectionKind::Requirements => 9,
            SectionKind::Context => 8,
            SectionKind::Constraints => 7,
            SectionKind::Output => 6,
            SectionKind::Content => 5,
            SectionKind::Examples => 4,
        }
    }

    /// Required sections are never dropped, only compressed.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            SectionKind::Objective | SectionKind::Requirements | SectionKind::Context
        )
    }

    pub fn heading(&self) -> &'static str {
        match self {
            SectionKind::Objective => "OBJECTIVE",
            SectionKind::Requirements => "REQUIREMENTS",
            SectionKind::Context => "CONTEXT",
            SectionKind::Constraints => "CONSTRAINTS",
            SectionKind::Output => "OUTPUT",
            SectionKind::Content => "CONTENT",
            SectionKind::Examples => "EXAMPLES",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSection {
    pub kind: SectionKind,
    pub content: String,
    pub priority: u8,
    pub required: bool,
    pub token_count: usize,
    /// True when the content was compressed or truncated to fit the budget
    pub compressed: bool,
}

impl PromptSection {
    fn new(kind: SectionKind, content: String) -> Self {
        PromptSection {
            kind,
            priority: kind.priority(),
            required: kind.is_required(),
            token_count: count_tokens(&content),
            content,
            compressed: false,
        }
    }

    fn squeeze(mut self, budget: usize) -> Self {
        let compressed = compress_prompt(&self.content, 1.0, false).compressed;
        self.content = truncate_to_tokens(&compressed, budget);
        self.token_count = count_tokens(&self.content);
        self.compressed = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatKind {
    Structured,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFormat {
    pub kind: OutputFormatKind,
    pub fields: Vec<String>,
    pub validation_rules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructureConstraints {
    /// Overrides the tier token limit
    pub max_tokens: Option<usize>,
    pub output_format: Option<OutputFormatKind>,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStructure {
    /// Sorted by priority, highest first
    pub sections: Vec<PromptSection>,
    pub instructions: Vec<String>,
    pub output_format: OutputFormat,
    pub token_limit: usize,
    pub total_tokens: usize,
    pub dropped_sections: Vec<SectionKind>,
}

/// Longest prefix (cut at a word boundary where possible) within `budget` tokens.
pub fn truncate_to_tokens(text: &str, budget: usize) -> String {
    if count_tokens(text) <= budget {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut take = (budget * 4).min(chars.len());
    loop {
        let mut candidate: String = chars[..take].iter().collect();
        if take < chars.len() {
            if let Some(idx) = candidate.rfind(char::is_whitespace) {
                candidate.truncate(idx);
            }
        }
        let candidate = candidate.trim_end().to_string();
        let tokens = count_tokens(&candidate);
        if tokens <= budget || take == 0 {
            return candidate;
        }
        take = take.saturating_sub((tokens - budget) * 4).min(take - 1);
    }
}

/// Split a prompt on section markers. Text outside any marker becomes `Content`.
pub fn parse_sections(prompt: &str) -> Vec<PromptSection> {
    let mut sections = Vec::new();
    let mut current_kind = SectionKind::Content;
    let mut buffer: Vec<&str> = Vec::new();

    let mut flush = |kind: SectionKind, buffer: &mut Vec<&str>| {
        let content = buffer.join("\n").trim().to_string();
        buffer.clear();
        if !content.is_empty() {
            sections.push(PromptSection::new(kind, content));
        }
    };

    for line in prompt.lines() {
        match SECTION_MARKER.captures(line) {
            Some(caps) => {
                flush(current_kind, &mut buffer);
                current_kind = SectionKind::from_keyword(&caps[1]);
                if let Some(rest) = caps.get(2) {
                    buffer.push(rest.as_str());
                }
            }
            None => buffer.push(line),
        }
    }
    flush(current_kind, &mut buffer);
    sections
}

fn type_instructions(prompt_type: AnalysisType) -> &'static [&'static str] {
    match prompt_type {
        AnalysisType::Comprehensive => &["Cover financial, operational, strategic, market and risk dimensions"],
        AnalysisType::Valuation => &[
            "Provide a valuation range with low, mid and high estimates",
            "Explain which valuation methods drive the range",
        ],
        AnalysisType::FinancialAnalysis => &["Assess profitability, liquidity, leverage and cash flow quality"],
        AnalysisType::RiskAssessment => &[
            "Rank risks by likelihood and impact",
            "Propose a mitigation for each material risk",
        ],
        AnalysisType::StrategicPlanning => &["Prioritize strategic initiatives with expected impact"],
        AnalysisType::MarketAnalysis => &["Assess market size, growth and competitive dynamics"],
        AnalysisType::OperationalAnalysis => &["Identify operational bottlenecks and efficiency gains"],
        AnalysisType::CompetitiveAnalysis => &["Compare positioning against competitors and assess the moat"],
    }
}

fn tier_instructions(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Consumer => &["Keep the analysis concise and focused on key takeaways"],
        Tier::Professional => &["Support each conclusion with specific metrics from the context"],
        Tier::Enterprise => &[
            "Include scenario analysis and strategic implications",
            "Address capital structure and stakeholder considerations",
        ],
    }
}

pub fn build_instructions(tier: Tier, prompt_type: AnalysisType) -> Vec<String> {
    const BASE: [&str; 3] = [
        "Base every conclusion on the supplied business data",
        "State assumptions explicitly where data is missing",
        "Quantify findings wherever possible",
    ];
    BASE.iter()
        .chain(type_instructions(prompt_type))
        .chain(tier_instructions(tier))
        .map(|s| s.to_string())
        .collect()
}

fn default_fields(prompt_type: AnalysisType) -> Vec<String> {
    let mut fields = vec!["summary", "key_findings", "recommendations", "risks", "confidence"];
    if prompt_type == AnalysisType::Valuation {
        fields.insert(1, "valuation_range");
    }
    fields.into_iter().map(String::from).collect()
}

pub fn build_output_format(tier: Tier, prompt_type: AnalysisType, constraints: &StructureConstraints) -> OutputFormat {
    let kind = constraints.output_format.unwrap_or(match tier {
        Tier::Consumer => OutputFormatKind::Structured,
        _ => OutputFormatKind::Json,
    });
    let fields = if constraints.required_fields.is_empty() {
        default_fields(prompt_type)
    } else {
        constraints.required_fields.clone()
    };
    let mut validation_rules = vec!["confidence must be between 0 and 1".to_string()];
    if kind == OutputFormatKind::Json {
        validation_rules.push("response must be a single valid JSON object containing every field".to_string());
    }
    OutputFormat {
        kind,
        fields,
        validation_rules,
    }
}

/// Fit the prompt's sections into the tier budget.
///
/// Sections are taken highest priority first. Required sections and
/// anything that fits stay whole; the first section that only partly fits
/// is compressed into the remaining budget and the rest are dropped. A
/// required section that does not fit is squeezed to whatever is left, so
/// the total never exceeds the limit.
pub fn optimize_structure(
    prompt: &str,
    tier: Tier,
    prompt_type: AnalysisType,
    constraints: &StructureConstraints,
) -> PromptStructure {
    let token_limit = constraints.max_tokens.unwrap_or_else(|| tier.token_limit());
    let mut sections = parse_sections(prompt);
    sections.sort_by(|a, b| b.priority.cmp(&a.priority));

    let total: usize = sections.iter().map(|s| s.token_count).sum();
    let mut dropped_sections = Vec::new();

    if total > token_limit {
        let mut kept = Vec::with_capacity(sections.len());
        let mut used = 0usize;
        for section in sections {
            let remaining = token_limit - used;
            let section = if section.token_count <= remaining {
                section
            } else if section.required || remaining >= MIN_PARTIAL_TOKENS {
                section.squeeze(remaining)
            } else {
                dropped_sections.push(section.kind);
                continue;
            };
            used += section.token_count;
            kept.push(section);
        }
        debug!(
            before = total,
            after = used,
            limit = token_limit,
            dropped = dropped_sections.len(),
            "Prompt sections fitted to budget"
        );
        sections = kept;
    }

    let total_tokens = sections.iter().map(|s| s.token_count).sum();
    PromptStructure {
        sections,
        instructions: build_instructions(tier, prompt_type),
        output_format: build_output_format(tier, prompt_type, constraints),
        token_limit,
        total_tokens,
        dropped_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(words: usize) -> String {
        (0..words).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_parse_sections_and_markers() {
        let prompt = "Intro text\n## Objective:\nValue the company\nRequirements\n- use multiples\nOutput format: JSON\nContext matters here";
        let sections = parse_sections(prompt);
        let kinds: Vec<SectionKind> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Content,
                SectionKind::Objective,
                SectionKind::Requirements,
                SectionKind::Output
            ]
        );
        // a sentence starting with a keyword is not a marker
        assert!(sections[3].content.contains("Context matters here"));
    }

    #[test]
    fn test_unmarked_prompt_is_single_content_section() {
        let sections = parse_sections("Just analyze this business.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Content);
        assert!(!sections[0].required);
    }

    #[test]
    fn test_sections_sorted_by_priority() {
        let prompt = "Examples:\nsample\nObjective:\ngoal\nConstraints:\nlimits";
        let structure = optimize_structure(prompt, Tier::Enterprise, AnalysisType::Valuation, &StructureConstraints::default());
        let priorities: Vec<u8> = structure.sections.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, vec![10, 7, 4]);
        assert!(structure.dropped_sections.is_empty());
    }

    #[test]
    fn test_budget_containment_keeps_required() {
        let prompt = format!(
            "Objective:\n{}\nContext:\n{}\nExamples:\n{}\nConstraints:\n{}",
            long_text(300),
            long_text(1500),
            long_text(1500),
            long_text(800)
        );
        for tier in Tier::all() {
            let structure = optimize_structure(&prompt, tier, AnalysisType::Comprehensive, &StructureConstraints::default());
            let total: usize = structure.sections.iter().map(|s| s.token_count).sum();
            assert!(total <= tier.token_limit(), "{} > {}", total, tier.token_limit());
            for kind in [SectionKind::Objective, SectionKind::Context] {
                assert!(structure.sections.iter().any(|s| s.kind == kind));
            }
        }
    }

    #[test]
    fn test_max_tokens_override() {
        let prompt = format!("Objective:\n{}\nExamples:\n{}", long_text(50), long_text(200));
        let constraints = StructureConstraints {
            max_tokens: Some(120),
            ..Default::default()
        };
        let structure = optimize_structure(&prompt, Tier::Enterprise, AnalysisType::Valuation, &constraints);
        assert_eq!(structure.token_limit, 120);
        assert!(structure.total_tokens <= 120);
    }

    #[test]
    fn test_truncate_to_tokens() {
        let text = long_text(100);
        let cut = truncate_to_tokens(&text, 10);
        assert!(count_tokens(&cut) <= 10);
        assert!(text.starts_with(&cut));
        assert_eq!(truncate_to_tokens(&text, 0), "");
    }

    #[test]
    fn test_output_format_defaults() {
        let consumer = build_output_format(Tier::Consumer, AnalysisType::Valuation, &StructureConstraints::default());
        assert_eq!(consumer.kind, OutputFormatKind::Structured);
        assert!(consumer.fields.contains(&"valuation_range".to_string()));
        let pro = build_output_format(Tier::Professional, AnalysisType::RiskAssessment, &StructureConstraints::default());
        assert_eq!(pro.kind, OutputFormatKind::Json);
        assert_eq!(pro.validation_rules.len(), 2);
    }

    #[test]
    fn test_instructions_combine_base_type_and_tier() {
        let ent = build_instructions(Tier::Enterprise, AnalysisType::RiskAssessment);
        assert_eq!(ent.len(), 3 + 2 + 2);
        assert!(ent.iter().any(|i| i.contains("scenario")));
    }
}
