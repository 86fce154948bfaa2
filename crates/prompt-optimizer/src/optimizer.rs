use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use valuation_core::{AnalysisType, Tier, Urgency, ValuationError, ValuationResult};

use crate::compressor::compress_prompt;
use crate::prioritizer::{calculate_priority, BusinessContextHints, PromptPriority};
use crate::structure::{
    build_instructions, build_output_format, optimize_structure, OutputFormatKind, PromptStructure, SectionKind,
    StructureConstraints,
};
use crate::tier::{tier_profile, TierProfile};
use crate::tokens::{calculate_cost, count_tokens, estimate_response_tokens, DEFAULT_MODEL};

const SPEED_REDUCTION_TARGET: f64 = 0.3;
const QUALITY_REDUCTION_TARGET: f64 = 0.1;
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationOptions {
    /// Overrides the tier token limit
    pub max_tokens: Option<usize>,
    pub prioritize_speed: bool,
    /// When false the compressor may abbreviate and drop example clauses
    pub preserve_quality: bool,
    pub urgency: Urgency,
    pub output_format: Option<OutputFormatKind>,
    pub required_fields: Vec<String>,
    /// Model used for cost estimates
    pub model: String,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            prioritize_speed: false,
            preserve_quality: true,
            urgency: Urgency::Medium,
            output_format: None,
            required_fields: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedPrompt {
    pub original: String,
    /// Section text after compression and budgeting
    pub optimized: String,
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    pub original_token_count: usize,
    /// Tokens in the rendered prompt, instructions and output format included
    pub token_count: usize,
    /// Optimized length over original length
    pub compression_ratio: f64,
    pub priority: PromptPriority,
    pub structure: PromptStructure,
    pub tier_profile: TierProfile,
    pub estimated_response_tokens: usize,
    pub estimated_cost: f64,
    pub optimization_time_ms: u64,
}

impl OptimizedPrompt {
    /// Full prompt text: sections, then instructions, then the output format.
    pub fn render(&self) -> String {
        render_prompt(&self.optimized, &self.structure)
    }
}

fn render_prompt(sections: &str, structure: &PromptStructure) -> String {
    let mut out = sections.to_string();

    if !structure.instructions.is_empty() {
        out.push_str("\n\nINSTRUCTIONS:");
        for instruction in &structure.instructions {
            out.push_str("\n- ");
            out.push_str(instruction);
        }
    }

    let format = &structure.output_format;
    out.push_str("\n\nOUTPUT FORMAT:");
    out.push_str(match format.kind {
        OutputFormatKind::Json => "\nRespond with JSON containing these fields:",
        OutputFormatKind::Structured => "\nRespond with clearly labelled sections for:",
    });
    for field in &format.fields {
        out.push_str("\n- ");
        out.push_str(field);
    }
    for rule in &format.validation_rules {
        out.push_str("\nRule: ");
        out.push_str(rule);
    }
    out.trim().to_string()
}

fn render_sections(structure: &PromptStructure) -> String {
    structure
        .sections
        .iter()
        .filter(|s| !s.content.is_empty())
        .map(|s| match s.kind {
            SectionKind::Content => s.content.clone(),
            kind => format!("{}:\n{}", kind.heading(), s.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn response_complexity(tier: Tier) -> f64 {
    match tier {
        Tier::Consumer => 0.3,
        Tier::Professional => 0.6,
        Tier::Enterprise => 0.9,
    }
}

/// One prompt in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: String,
    pub prompt: String,
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub hints: BusinessContextHints,
    #[serde(default)]
    pub options: OptimizationOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum BatchMode {
    Sequential,
    Parallel { max_concurrency: usize },
}

impl Default for BatchMode {
    fn default() -> Self {
        BatchMode::Parallel {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug)]
pub struct BatchResult {
    pub id: String,
    pub result: ValuationResult<OptimizedPrompt>,
}

/// Stateless prompt optimization pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptOptimizer;

impl PromptOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Prioritize, compress, fit to budget and annotate a prompt.
    pub fn optimize_prompt(
        &self,
        prompt: &str,
        tier: Tier,
        analysis_type: AnalysisType,
        hints: &BusinessContextHints,
        options: &OptimizationOptions,
    ) -> OptimizedPrompt {
        let started = Instant::now();

        let priority = calculate_priority(analysis_type, tier, hints, options.urgency);
        let target = if options.prioritize_speed {
            SPEED_REDUCTION_TARGET
        } else {
            QUALITY_REDUCTION_TARGET
        };
        let compression = compress_prompt(prompt, target, options.preserve_quality);

        let token_limit = options.max_tokens.unwrap_or_else(|| tier.token_limit());
        let mut constraints = StructureConstraints {
            max_tokens: None,
            output_format: options.output_format,
            required_fields: options.required_fields.clone(),
        };

        // Sections get what the instructions and output format leave over. Headings
        // and separators are only known after rendering, so shrink until it fits.
        let scaffold = PromptStructure {
            sections: Vec::new(),
            instructions: build_instructions(tier, analysis_type),
            output_format: build_output_format(tier, analysis_type, &constraints),
            token_limit,
            total_tokens: 0,
            dropped_sections: Vec::new(),
        };
        let mut section_budget = token_limit.saturating_sub(count_tokens(&render_prompt("", &scaffold)));
        let (mut structure, optimized, token_count) = loop {
            constraints.max_tokens = Some(section_budget);
            let structure = optimize_structure(&compression.compressed, tier, analysis_type, &constraints);
            let optimized = render_sections(&structure);
            let rendered_tokens = count_tokens(&render_prompt(&optimized, &structure));
            if rendered_tokens <= token_limit || section_budget == 0 {
                break (structure, optimized, rendered_tokens);
            }
            section_budget = section_budget.saturating_sub(rendered_tokens - token_limit);
        };
        if token_count > token_limit {
            warn!(
                limit = token_limit,
                tokens = token_count,
                "Rendered prompt exceeds the token limit"
            );
        }
        structure.token_limit = token_limit;

        let original_token_count = count_tokens(prompt);
        let original_chars = prompt.chars().count();
        let compression_ratio = if original_chars == 0 {
            1.0
        } else {
            optimized.chars().count() as f64 / original_chars as f64
        };
        let estimated_response_tokens = estimate_response_tokens(token_count, response_complexity(tier));
        let estimated_cost = calculate_cost(token_count, estimated_response_tokens, &options.model);

        debug!(
            tier = tier.as_str(),
            analysis_type = analysis_type.as_str(),
            before = original_token_count,
            after = token_count,
            priority = ?priority.level,
            "Prompt optimized"
        );

        OptimizedPrompt {
            original: prompt.to_string(),
            optimized,
            tier,
            analysis_type,
            original_token_count,
            token_count,
            compression_ratio,
            priority,
            structure,
            tier_profile: tier_profile(tier),
            estimated_response_tokens,
            estimated_cost,
            optimization_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn optimize_item(&self, item: &BatchItem) -> OptimizedPrompt {
        self.optimize_prompt(&item.prompt, item.tier, item.analysis_type, &item.hints, &item.options)
    }

    /// Optimize many prompts. Results come back in input order.
    ///
    /// Parallel mode runs each chunk of `max_concurrency` items on the
    /// blocking pool and waits for the whole chunk before starting the next.
    pub async fn batch_optimize(&self, items: Vec<BatchItem>, mode: BatchMode) -> Vec<BatchResult> {
        let total = items.len();
        let results = match mode {
            BatchMode::Sequential => {
                let mut results = Vec::with_capacity(total);
                for item in items {
                    let result = Ok(self.optimize_item(&item));
                    results.push(BatchResult { id: item.id, result });
                    tokio::task::yield_now().await;
                }
                results
            }
            BatchMode::Parallel { max_concurrency } => {
                let chunk_size = max_concurrency.max(1);
                let mut results = Vec::with_capacity(total);
                for (index, chunk) in items.chunks(chunk_size).enumerate() {
                    let tasks = chunk.iter().cloned().map(|item| {
                        let optimizer = *self;
                        async move {
                            let id = item.id.clone();
                            let result = tokio::task::spawn_blocking(move || optimizer.optimize_item(&item))
                                .await
                                .map_err(|e| ValuationError::Task(e.to_string()));
                            if let Err(e) = &result {
                                warn!(id = %id, error = %e, "Batch item failed");
                            }
                            BatchResult { id, result }
                        }
                    });
                    results.extend(join_all(tasks).await);
                    debug!(chunk = index, done = results.len(), total, "Batch chunk complete");
                }
                results
            }
        };

        info!(
            total,
            failed = results.iter().filter(|r| r.result.is_err()).count(),
            "Batch optimization finished"
        );
        results
    }
}
