//! Builds the normalized, tier-aware [`AnalysisContext`] from questionnaire
//! data and renders it for prompts.

pub mod benchmark;
pub mod builder;
pub mod enterprise;
pub mod financial;
pub mod format;
pub mod input;
pub mod insights;
mod lenient;
pub mod market;
pub mod operational;
pub mod prioritize;
pub mod profile;
pub mod quality;
pub mod risk;
pub mod strategic;
pub mod trend;
pub mod types;
pub mod validate;
#[cfg(test)]
mod tests;

pub use builder::{build_enterprise_context, build_professional_context};
pub use format::{format_context_for_prompt, SECTION_HEADERS};
pub use input::*;
pub use prioritize::{prioritize_context_data, priority_weights};
pub use profile::{determine_business_size, determine_business_stage};
pub use trend::analyze_trend;
pub use types::*;
pub use validate::{validate_and_sanitize_context, ValidatedContext};
