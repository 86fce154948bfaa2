//! Character-based token estimates and per-model cost lookup.
//!
//! This is an approximation (about four characters per token) and does not
//! depend on any model tokenizer.

use lazy_static::lazy_static;

use regex::Regex;
use serde::{Deserialize, Serialize};

const CHARS_PER_TOKEN: usize = 4;
/// 15 for the opening marker plus 10 for the closing one.
const JSON_FRAGMENT_SURCHARGE: usize = 25;
const RESPONSE_RATIO: f64 = 0.3;

lazy_static! {
    static ref JSON_FRAGMENT: Regex = Regex::new(r"\{[^{}]*\}").expect("json fragment regex");
}

/// Per-1K-token pricing in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

pub const DEFAULT_MODEL: &str = "gpt-4";

pub fn model_pricing(model: &str) -> ModelPricing {
    match model.trim().to_lowercase().as_str() {
        "gpt-4-turbo" => ModelPricing {
            input: 0.01,
            output: 0.03,
        },
        "gpt-3.5-turbo" => ModelPricing {
            input: 0.0015,
            output: 0.002,
        },
        // gpt-4 and anything unknown
        _ => ModelPricing {
            input: 0.03,
            output: 0.06,
        },
    }
}

/// Estimated token count: `ceil(chars / 4)` plus a surcharge per `{...}` fragment.
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let chars = text.chars().count();
    let fragments = JSON_FRAGMENT.find_iter(text).count();
    chars.div_ceil(CHARS_PER_TOKEN) + fragments * JSON_FRAGMENT_SURCHARGE
}

pub fn count_json_tokens(value: &serde_json::Value) -> usize {
    count_tokens(&value.to_string())
}

/// Expected response length for a prompt; `complexity` is clamped to 0-1.
pub fn estimate_response_tokens(prompt_tokens: usize, complexity: f64) -> usize {
    let complexity = if complexity.is_nan() { 0.0 } else { complexity.clamp(0.0, 1.0) };
    (prompt_tokens as f64 * RESPONSE_RATIO * (1.0 + complexity * 2.0)).ceil() as usize
}

/// Dollar cost of a call; unknown models are priced as gpt-4.
pub fn calculate_cost(input_tokens: usize, output_tokens: usize, model: &str) -> f64 {
    let pricing = model_pricing(model);
    input_tokens as f64 / 1000.0 * pricing.input + output_tokens as f64 / 1000.0 * pricing.output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_zero_tokens() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn test_character_estimate() {
        assert_eq!(count_tokens("abcd"), 1);
        assert_eq!(count_tokens("abcde"), 2);
    }

    #[test]
    fn test_json_fragments_add_surcharge() {
        let plain = count_tokens("revenue: 100");
        let json = count_tokens("{revenue: 100}");
        assert_eq!(json, 4 + 25);
        assert!(json > plain);
    }

    #[test]
    fn test_response_estimate() {
        assert_eq!(estimate_response_tokens(1000, 0.0), 300);
        assert_eq!(estimate_response_tokens(1000, 1.0), 900);
        assert_eq!(estimate_response_tokens(1000, 5.0), 900);
    }

    #[test]
    fn test_gpt4_costs_more_than_gpt35() {
        assert!(calculate_cost(1000, 500, "gpt-4") > calculate_cost(1000, 500, "gpt-3.5-turbo"));
        assert!((calculate_cost(1000, 1000, "gpt-4") - 0.09).abs() < 1e-12);
        assert_eq!(
            calculate_cost(1000, 500, "mystery-model"),
            calculate_cost(1000, 500, "gpt-4")
        );
    }
}
