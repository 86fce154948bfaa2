//! End-to-end valuation flow: questionnaire data in, scored analysis out.

use std::sync::Arc;

use analysis_context::{
    build_enterprise_context, build_professional_context, prioritize_context_data,
    validate_and_sanitize_context, AnalysisContext, EnterpriseTierData,
};
use analysis_scorer::{
    calculate_confidence_score, calculate_quality_score, validate_analysis_output, AnalysisMetadata,
    ConfidenceScoring, DecisionOutcome, OutputValidation, QualityScoring,
};
use chrono::{DateTime, Utc};
use prompt_optimizer::{
    BatchItem, BatchMode, BusinessContextHints, OptimizationOptions, OptimizedPrompt, PromptOptimizer,
};
use prompt_templates::{generate_prompt, required_output_fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use valuation_core::{
    AnalysisProvider, AnalysisType, CompletionRequest, PriorityLevel, Tier, Urgency, ValuationError,
    ValuationResult,
};

use crate::config::PipelineConfig;

pub const SYSTEM_PROMPT: &str = "You are a senior business valuation analyst. \
Respond with a single JSON object that follows the requested output format exactly.";
const MIN_OUTPUT_TOKENS: usize = 512;

/// One analysis request.
///
/// `data` uses the enterprise schema; professional questionnaires simply leave
/// the enterprise sections empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRequest {
    pub id: String,
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    pub data: EnterpriseTierData,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub options: OptimizationOptions,
    /// Results of earlier decisions, used for historical accuracy
    #[serde(default)]
    pub decision_outcomes: Vec<DecisionOutcome>,
}

/// Everything produced before the LLM is called.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedAnalysis {
    pub request_id: String,
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    pub context: AnalysisContext,
    pub validation_warnings: Vec<String>,
    pub validation_errors: Vec<String>,
    /// Template prompt before optimization
    pub template_prompt: String,
    pub optimized: OptimizedPrompt,
}

/// Dry-run view of a prepared analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEstimates {
    pub request_id: String,
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    pub priority: PriorityLevel,
    pub original_tokens: usize,
    pub prompt_tokens: usize,
    pub estimated_response_tokens: usize,
    pub estimated_cost: f64,
    pub dropped_sections: Vec<String>,
    pub warnings: Vec<String>,
    /// Exact text sent to the provider
    pub prompt: String,
}

impl PreparedAnalysis {
    pub fn estimates(&self) -> PromptEstimates {
        PromptEstimates {
            request_id: self.request_id.clone(),
            tier: self.tier,
            analysis_type: self.analysis_type,
            priority: self.optimized.priority.level,
            original_tokens: self.optimized.original_token_count,
            prompt_tokens: self.optimized.token_count,
            estimated_response_tokens: self.optimized.estimated_response_tokens,
            estimated_cost: self.optimized.estimated_cost,
            dropped_sections: self
                .optimized
                .structure
                .dropped_sections
                .iter()
                .map(|s| s.heading().to_string())
                .collect(),
            warnings: self.validation_warnings.clone(),
            prompt: self.optimized.render(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionUsage {
    pub provider: String,
    pub model: String,
    pub input_tokens: Option<usize>,
    pub output_tokens: Option<usize>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub request_id: String,
    pub tier: Tier,
    pub analysis_type: AnalysisType,
    /// Parsed analysis, absent when the completion was not a JSON object
    pub analysis: Option<Value>,
    pub output_validation: OutputValidation,
    pub confidence: ConfidenceScoring,
    pub quality: QualityScoring,
    pub usage: CompletionUsage,
    pub estimated_cost: f64,
    pub completed_at: DateTime<Utc>,
}

/// Context, prompt and options for one request, ready for optimization.
struct StagedPrompt {
    context: AnalysisContext,
    warnings: Vec<String>,
    errors: Vec<String>,
    prompt: String,
    hints: BusinessContextHints,
    options: OptimizationOptions,
}

pub struct ValuationPipeline {
    config: PipelineConfig,
    optimizer: PromptOptimizer,
    provider: Arc<dyn AnalysisProvider>,
}

impl ValuationPipeline {
    pub fn new(config: PipelineConfig, provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            config,
            optimizer: PromptOptimizer::new(),
            provider,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build, validate and prioritize the context, then render and optimize
    /// the prompt. Fails only for tiers without a prompt template.
    pub fn prepare(&self, request: &ValuationRequest) -> ValuationResult<PreparedAnalysis> {
        let staged = self.stage(request)?;
        let optimized = self.optimizer.optimize_prompt(
            &staged.prompt,
            request.tier,
            request.analysis_type,
            &staged.hints,
            &staged.options,
        );
        Ok(finish_preparation(request, staged, optimized))
    }

    /// Prepare many requests, optimizing prompts in parallel chunks of
    /// `batch_max_concurrency`. Results keep input order.
    pub async fn prepare_batch(&self, requests: &[ValuationRequest]) -> Vec<ValuationResult<PreparedAnalysis>> {
        let mut staged = Vec::with_capacity(requests.len());
        let mut items = Vec::new();
        for request in requests {
            match self.stage(request) {
                Ok(stage) => {
                    items.push(BatchItem {
                        id: request.id.clone(),
                        prompt: stage.prompt.clone(),
                        tier: request.tier,
                        analysis_type: request.analysis_type,
                        hints: stage.hints.clone(),
                        options: stage.options.clone(),
                    });
                    staged.push(Ok(stage));
                }
                Err(e) => staged.push(Err(e)),
            }
        }

        let mode = BatchMode::Parallel {
            max_concurrency: self.config.batch_max_concurrency,
        };
        let mut optimized = self.optimizer.batch_optimize(items, mode).await.into_iter();

        requests
            .iter()
            .zip(staged)
            .map(|(request, stage)| {
                let stage = stage?;
                let batch = optimized
                    .next()
                    .ok_or_else(|| ValuationError::Task(format!("no batch result for {}", request.id)))?;
                Ok(finish_preparation(request, stage, batch.result?))
            })
            .collect()
    }

    /// Prepare, call the provider, then validate and score the completion.
    pub async fn run(&self, request: &ValuationRequest) -> ValuationResult<AnalysisOutcome> {
        let prepared = self.prepare(request)?;

        let prompt = prepared.optimized.render();
        let completion_request = CompletionRequest {
            prompt: prompt.clone(),
            system: Some(SYSTEM_PROMPT.to_string()),
            model: self.config.model.clone(),
            max_output_tokens: prepared.optimized.estimated_response_tokens.max(MIN_OUTPUT_TOKENS),
            temperature: self.config.temperature,
        };
        let completion = self.provider.complete(&completion_request).await?;

        let output_validation = validate_analysis_output(&completion.content, request.tier);
        let analysis = output_validation.value.clone().unwrap_or(Value::Null);

        let metadata = AnalysisMetadata {
            model: completion.model.clone(),
            version: None,
            latency_ms: completion.latency_ms,
            generated_at: Some(completion.completed_at),
            decision_outcomes: request.decision_outcomes.clone(),
        };
        let confidence = calculate_confidence_score(&analysis, &prepared.context, &metadata);
        let quality = calculate_quality_score(&analysis, &prompt, request.tier);

        if output_validation.is_valid {
            info!(
                request_id = %request.id,
                confidence = confidence.calibration.calibrated,
                quality = quality.overall,
                "Analysis scored"
            );
        } else {
            warn!(
                request_id = %request.id,
                errors = ?output_validation.errors,
                quality = quality.overall,
                "Analysis output invalid"
            );
        }

        Ok(AnalysisOutcome {
            request_id: request.id.clone(),
            tier: request.tier,
            analysis_type: request.analysis_type,
            analysis: output_validation.value.clone(),
            output_validation,
            confidence,
            quality,
            usage: CompletionUsage {
                provider: self.provider.name().to_string(),
                model: completion.model,
                input_tokens: completion.input_tokens,
                output_tokens: completion.output_tokens,
                latency_ms: completion.latency_ms,
            },
            estimated_cost: prepared.optimized.estimated_cost,
            completed_at: completion.completed_at,
        })
    }

    fn stage(&self, request: &ValuationRequest) -> ValuationResult<StagedPrompt> {
        let built = match request.tier {
            Tier::Enterprise => build_enterprise_context(&request.data),
            Tier::Professional => build_professional_context(&request.data.professional),
            Tier::Consumer => return Err(ValuationError::UnsupportedTier(request.tier.to_string())),
        };

        let validated = validate_and_sanitize_context(&built);
        if !validated.is_valid() {
            warn!(
                request_id = %request.id,
                errors = ?validated.errors,
                "Context failed consistency checks, continuing with sanitized values"
            );
        }
        let context = prioritize_context_data(&validated.context, request.analysis_type);
        let prompt = generate_prompt(request.tier, request.analysis_type, &context)?;
        let hints = hints_from_context(&context);
        let options = self.effective_options(request)?;

        Ok(StagedPrompt {
            context,
            warnings: validated.warnings,
            errors: validated.errors,
            prompt,
            hints,
            options,
        })
    }

    fn effective_options(&self, request: &ValuationRequest) -> ValuationResult<OptimizationOptions> {
        let mut options = request.options.clone();
        options.urgency = request.urgency;
        options.model = self.config.model.clone();
        options.prioritize_speed |= self.config.prioritize_speed;
        if options.max_tokens.is_none() {
            options.max_tokens = self.config.max_tokens;
        }
        if options.required_fields.is_empty() {
            options.required_fields = required_output_fields(request.tier)?;
        }
        Ok(options)
    }
}

fn finish_preparation(request: &ValuationRequest, staged: StagedPrompt, optimized: OptimizedPrompt) -> PreparedAnalysis {
    info!(
        request_id = %request.id,
        tier = request.tier.as_str(),
        analysis_type = request.analysis_type.as_str(),
        tokens_before = optimized.original_token_count,
        tokens_after = optimized.token_count,
        priority = ?optimized.priority.level,
        "Analysis prepared"
    );

    PreparedAnalysis {
        request_id: request.id.clone(),
        tier: request.tier,
        analysis_type: request.analysis_type,
        context: staged.context,
        validation_warnings: staged.warnings,
        validation_errors: staged.errors,
        template_prompt: staged.prompt,
        optimized,
    }
}

/// Priority inputs taken from the built context.
pub fn hints_from_context(context: &AnalysisContext) -> BusinessContextHints {
    BusinessContextHints {
        annual_revenue: Some(context.financial_metrics.performance.revenue.current),
        stage: Some(context.business_profile.stage),
        risk_tolerance: Some(context.risk_profile.risk_tolerance),
    }
}
