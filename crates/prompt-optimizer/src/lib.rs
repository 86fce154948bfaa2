//! Token-budgeted prompt optimization: estimation, compression,
//! prioritization, structuring and tier declarations.

pub mod compressor;
pub mod optimizer;
pub mod prioritizer;
pub mod structure;
pub mod tier;
pub mod tokens;

pub use compressor::{compress_prompt, estimate_compression_potential, CompressionPotential, CompressionResult, Effort};
pub use optimizer::{BatchItem, BatchMode, BatchResult, OptimizationOptions, OptimizedPrompt, PromptOptimizer};
pub use prioritizer::{calculate_priority, BusinessContextHints, PriorityFactor, PromptPriority};
pub use structure::{optimize_structure, OutputFormat, OutputFormatKind, PromptSection, PromptStructure, SectionKind, StructureConstraints};
pub use tier::{tier_profile, TierProfile};
pub use tokens::{calculate_cost, count_tokens, estimate_response_tokens};
