//! Valuation pipeline: wires context building, prompt generation and
//! optimization, the LLM provider and scoring into one flow.

pub mod config;
pub mod pipeline;
pub mod provider;

pub use config::PipelineConfig;
pub use pipeline::{
    hints_from_context, AnalysisOutcome, CompletionUsage, PreparedAnalysis, PromptEstimates, ValuationPipeline,
    ValuationRequest, SYSTEM_PROMPT,
};
pub use provider::{HttpAnalysisProvider, ProviderError, ProviderResult};
