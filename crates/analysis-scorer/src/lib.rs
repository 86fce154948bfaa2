//! Analysis Scorer
//!
//! Post-hoc confidence and quality scoring for LLM-produced valuations, plus
//! validation of the raw completion against the tier's output schema.

pub mod confidence;
pub mod output;
pub mod quality;

pub use confidence::{
    calculate_confidence_score, AnalysisMetadata, Calibration, ConfidenceInterval,
    ConfidenceScoring, DecisionOutcome, ScoringFactor,
};
pub use output::{tier_required_fields, validate_analysis_output, OutputValidation};
pub use quality::{calculate_quality_score, key_terms, QualityCriterion, QualityDimension, QualityScoring};
