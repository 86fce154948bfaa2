use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::env;
use std::time::Duration;
use valuation_core::Tier;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    // LLM endpoint
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f64,

    // Request defaults
    pub default_tier: Tier,

    // Optimizer
    pub batch_max_concurrency: usize,
    pub prioritize_speed: bool,
    pub max_tokens: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            temperature: 0.2,
            default_tier: Tier::Professional,
            batch_max_concurrency: 5,
            prioritize_speed: false,
            max_tokens: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to defaults; set but
    /// malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            api_url: get("LLM_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_key: get("LLM_API_KEY"),
            model: get("LLM_MODEL").unwrap_or(defaults.model),
            timeout: match get("LLM_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(
                    v.trim()
                        .parse()
                        .with_context(|| format!("LLM_TIMEOUT_SECS must be whole seconds, got '{}'", v))?,
                ),
                None => defaults.timeout,
            },
            temperature: match get("LLM_TEMPERATURE") {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("LLM_TEMPERATURE must be a number, got '{}'", v))?,
                None => defaults.temperature,
            },
            default_tier: match get("VALUATION_DEFAULT_TIER") {
                Some(v) => v.parse().context("VALUATION_DEFAULT_TIER is not a known tier")?,
                None => defaults.default_tier,
            },
            batch_max_concurrency: match get("BATCH_MAX_CONCURRENCY") {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("BATCH_MAX_CONCURRENCY must be a positive integer, got '{}'", v))?,
                None => defaults.batch_max_concurrency,
            },
            prioritize_speed: match get("PRIORITIZE_SPEED") {
                Some(v) => v
                    .trim()
                    .to_lowercase()
                    .parse()
                    .with_context(|| format!("PRIORITIZE_SPEED must be true or false, got '{}'", v))?,
                None => defaults.prioritize_speed,
            },
            max_tokens: get("PROMPT_MAX_TOKENS")
                .map(|v| {
                    v.trim()
                        .parse::<usize>()
                        .with_context(|| format!("PROMPT_MAX_TOKENS must be a positive integer, got '{}'", v))
                })
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            bail!("LLM_API_URL must be an http(s) URL, got '{}'", self.api_url);
        }
        if self.timeout.is_zero() {
            bail!("LLM_TIMEOUT_SECS must be greater than zero");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("LLM_TEMPERATURE must be between 0 and 2, got {}", self.temperature);
        }
        if self.batch_max_concurrency == 0 {
            bail!("BATCH_MAX_CONCURRENCY must be at least 1");
        }
        if self.max_tokens == Some(0) {
            bail!("PROMPT_MAX_TOKENS must be greater than zero");
        }
        Ok(())
    }

    /// Live calls need a key; dry runs do not.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().context("LLM_API_KEY not set")
    }
}
