use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tokens::count_tokens;

const REPEAT_WINDOW: usize = 10;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules(specs: &[(&str, &'static str)]) -> Vec<Rule> {
    specs
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).expect("compression rule regex"),
            replacement,
        })
        .collect()
}

lazy_static! {
    static ref NORMALIZE: Vec<Rule> = {
        rules(&[
            (r"[ \t]+\n", "\n"),
            (r"[ \t]+", " "),
            (r"\n{3,}", "\n\n"),
            (r" +([,.;:!?])", "$1"),
            (r"!{2,}", "!"),
            (r"\?{2,}", "?"),
            (r",{2,}", ","),
        ])
    };

    static ref EXAMPLE_CLAUSES: Vec<Rule> = {
        rules(&[
            (r"(?i)\s*\((?:e\.g\.|for example|for instance|such as)[^)]*\)", ""),
            (r"(?i),?\s*\b(?:for example|for instance|such as)\b[^.;\n]*", ""),
            (r"(?i),?\s*\be\.g\.[^.;\n]*", ""),
        ])
    };

    static ref VERBOSE_PHRASES: Vec<Rule> = {
        rules(&[
            (r"(?i)\bin order to\b", "to"),
            (r"(?i)\bdue to the fact that\b", "because"),
            (r"(?i)\bat this point in time\b", "now"),
            (r"(?i)\bin the event that\b", "if"),
            (r"(?i)\bwith regard to\b", "regarding"),
            (r"(?i)\ba large number of\b", "many"),
            (r"(?i)\bit is important to note that\s*", ""),
            (r"(?i)\bplease note that\s*", ""),
        ])
    };

    static ref ABBREVIATIONS: Vec<Rule> = {
        rules(&[
            (r"(?i)\bbusiness\b", "biz"),
            (r"(?i)\bfinancial\b", "fin"),
            (r"(?i)\bmanagement\b", "mgmt"),
            (r"(?i)\binformation\b", "info"),
            (r"(?i)\bdevelopment\b", "dev"),
            (r"(?i)\bperformance\b", "perf"),
            (r"(?i)\boperations\b", "ops"),
            (r"(?i)\bassessment\b", "assmt"),
            (r"(?i)\brecommendation\b", "rec"),
            (r"(?i)\bapproximately\b", "approx"),
        ])
    };

    static ref EXAMPLE_MARKER: Regex = {
        Regex::new(r"(?i)\b(?:for example|for instance|such as)\b|\be\.g\.").expect("example marker regex")
    };

    static ref MULTI_SPACE: Regex = Regex::new(r" {2,}").expect("multi space regex");
}

fn apply(text: &str, rules: &[Rule]) -> String {
    rules.iter().fold(text.to_string(), |acc, rule| {
        rule.pattern.replace_all(&acc, rule.replacement).into_owned()
    })
}

/// Whitespace and punctuation cleanup. Idempotent on already clean text.
pub fn normalize(text: &str) -> String {
    apply(text, &NORMALIZE).trim().to_string()
}

fn aggressive(text: &str) -> String {
    let stripped = apply(text, &EXAMPLE_CLAUSES);
    let rewritten = apply(&stripped, &VERBOSE_PHRASES);
    normalize(&apply(&rewritten, &ABBREVIATIONS))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub compressed: String,
    /// Compressed length over original length (1.0 for empty input)
    pub ratio: f64,
    /// Estimated tokens saved
    pub savings: usize,
}

fn char_ratio(compressed: &str, original: &str) -> f64 {
    let original_len = original.chars().count();
    if original_len == 0 {
        return 1.0;
    }
    compressed.chars().count() as f64 / original_len as f64
}

/// Compress `text`, aiming for `target_reduction` (fraction of characters removed).
///
/// Normalization always runs. The lossy pass (example clauses, verbose
/// phrasing, abbreviations) only runs when `preserve_quality` is false and
/// normalization alone falls short of the target.
pub fn compress_prompt(text: &str, target_reduction: f64, preserve_quality: bool) -> CompressionResult {
    let mut compressed = normalize(text);
    if !preserve_quality && 1.0 - char_ratio(&compressed, text) < target_reduction {
        compressed = aggressive(&compressed);
    }
    CompressionResult {
        ratio: char_ratio(&compressed, text),
        savings: count_tokens(text).saturating_sub(count_tokens(&compressed)),
        compressed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionOpportunity {
    pub kind: String,
    pub description: String,
    pub estimated_savings: usize,
    pub effort: Effort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionPotential {
    /// 0-1
    pub potential: f64,
    pub opportunities: Vec<CompressionOpportunity>,
}

/// Characters covered by 10-character windows that already occurred earlier
/// without overlapping.
fn repeated_chars(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < REPEAT_WINDOW * 2 {
        return 0;
    }
    let mut first_seen: HashMap<&[char], usize> = HashMap::new();
    let mut covered = vec![false; chars.len()];
    for (i, window) in chars.windows(REPEAT_WINDOW).enumerate() {
        match first_seen.get(window) {
            Some(&first) if i >= first + REPEAT_WINDOW => {
                covered[i..i + REPEAT_WINDOW].iter_mut().for_each(|c| *c = true);
            }
            Some(_) => {}
            None => {
                first_seen.insert(window, i);
            }
        }
    }
    covered.iter().filter(|&&c| c).count()
}

pub fn estimate_compression_potential(text: &str) -> CompressionPotential {
    let mut potential = 0.0;
    let mut opportunities = Vec::new();

    let repeated = repeated_chars(text);
    if repeated > 0 {
        potential += 0.3;
        opportunities.push(CompressionOpportunity {
            kind: "repetition".to_string(),
            description: "Repeated phrases could be stated once and referenced".to_string(),
            estimated_savings: repeated.div_ceil(4),
            effort: Effort::High,
        });
    }

    let examples = EXAMPLE_MARKER.find_iter(text).count();
    if examples > 0 {
        potential += (examples as f64 * 0.05).min(0.25);
        opportunities.push(CompressionOpportunity {
            kind: "examples".to_string(),
            description: format!("{} illustrative example clause(s) could be trimmed", examples),
            estimated_savings: examples * 8,
            effort: Effort::Medium,
        });
    }

    let spaces = MULTI_SPACE.find_iter(text).count();
    if spaces > 0 {
        potential += 0.1;
        opportunities.push(CompressionOpportunity {
            kind: "whitespace".to_string(),
            description: format!("{} run(s) of extra spaces", spaces),
            estimated_savings: spaces,
            effort: Effort::Low,
        });
    }

    CompressionPotential {
        potential: potential.min(1.0),
        opportunities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_unchanged() {
        let clean = "Analyze the business.\n\nFocus on margins, growth and risk.";
        let result = compress_prompt(clean, 0.0, true);
        assert_eq!(result.compressed, clean.trim());
        assert_eq!(result.savings, 0);
        assert!((result.ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalization() {
        let messy = "  Revenue   is up  ,  margins too!!!\n\n\n\nNext   section \t ";
        let result = compress_prompt(messy, 0.0, true);
        assert_eq!(result.compressed, "Revenue is up, margins too!\n\nNext section");
        assert!(result.ratio < 1.0);
    }

    #[test]
    fn test_preserve_quality_skips_abbreviations() {
        let text = "Review the financial performance of the business.";
        assert_eq!(compress_prompt(text, 0.5, true).compressed, text);
    }

    #[test]
    fn test_aggressive_pass() {
        let text = "In order to assess the Business, review financial metrics, such as revenue and margin. Provide a recommendation.";
        let result = compress_prompt(text, 0.3, false);
        assert_eq!(
            result.compressed,
            "to assess the biz, review fin metrics. Provide a rec."
        );
        assert!(result.savings > 0);
    }

    #[test]
    fn test_empty_input() {
        let result = compress_prompt("", 0.3, false);
        assert_eq!(result.compressed, "");
        assert_eq!(result.ratio, 1.0);
    }

    #[test]
    fn test_potential_detects_all_kinds() {
        let text = "Check revenue growth trends. Check revenue growth trends.  Use examples, e.g. SaaS.";
        let potential = estimate_compression_potential(text);
        let kinds: Vec<&str> = potential.opportunities.iter().map(|o| o.kind.as_str()).collect();
        assert_eq!(kinds, vec!["repetition", "examples", "whitespace"]);
        assert!((potential.potential - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_potential_of_clean_text_is_zero() {
        let potential = estimate_compression_potential("Short prompt.");
        assert_eq!(potential.potential, 0.0);
        assert!(potential.opportunities.is_empty());
    }
}
