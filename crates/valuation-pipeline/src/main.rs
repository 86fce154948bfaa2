//! valuation-pipeline: build an AI valuation prompt from questionnaire data
//! and, unless dry-running, send it to the configured LLM and score the result.
//!
//! Usage:
//!   valuation-pipeline <input.json> [--tier professional|enterprise] [--type valuation] [--dry-run]
//!
//! The input file holds one questionnaire object or an array of them.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use valuation_core::{AnalysisType, Tier};
use valuation_pipeline::{HttpAnalysisProvider, PipelineConfig, ValuationPipeline, ValuationRequest};

const USAGE: &str = "usage: valuation-pipeline <input.json> [--tier T] [--type A] [--dry-run]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let input = args
        .iter()
        .enumerate()
        .find(|(i, a)| !a.starts_with("--") && !is_flag_value(&args, *i))
        .map(|(_, a)| a.clone())
        .context(USAGE)?;

    let config = PipelineConfig::from_env()?;
    tracing::info!(
        model = %config.model,
        api_url = %config.api_url,
        default_tier = config.default_tier.as_str(),
        "Configuration loaded"
    );

    let tier: Tier = match flag_value(&args, "--tier") {
        Some(v) => v.parse().context("--tier")?,
        None => config.default_tier,
    };
    let analysis_type: AnalysisType = match flag_value(&args, "--type") {
        Some(v) => v.parse().context("--type")?,
        None => AnalysisType::Comprehensive,
    };

    let requests = load_requests(Path::new(&input), tier, analysis_type)?;
    tracing::info!(count = requests.len(), tier = tier.as_str(), "Requests loaded from {}", input);

    let provider = HttpAnalysisProvider::from_config(&config).context("Failed to create HTTP client")?;
    let pipeline = ValuationPipeline::new(config, Arc::new(provider));

    if dry_run {
        let mut estimates = Vec::with_capacity(requests.len());
        for (request, prepared) in requests.iter().zip(pipeline.prepare_batch(&requests).await) {
            let prepared = prepared.with_context(|| format!("Failed to prepare {}", request.id))?;
            estimates.push(prepared.estimates());
        }
        println!("{}", serde_json::to_string_pretty(&estimates)?);
        return Ok(());
    }

    pipeline.config().require_api_key()?;
    let mut outcomes = Vec::with_capacity(requests.len());
    for request in &requests {
        let outcome = pipeline
            .run(request)
            .await
            .with_context(|| format!("Analysis {} failed", request.id))?;
        outcomes.push(outcome);
    }
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn is_flag_value(args: &[String], index: usize) -> bool {
    index > 0 && matches!(args[index - 1].as_str(), "--tier" | "--type")
}

fn load_requests(path: &Path, tier: Tier, analysis_type: AnalysisType) -> Result<Vec<ValuationRequest>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("request")
        .to_string();
    let documents = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        _ => bail!("{} must hold a questionnaire object or an array of them", path.display()),
    };

    documents
        .into_iter()
        .enumerate()
        .map(|(i, doc)| {
            let data = serde_json::from_value(doc)
                .with_context(|| format!("Entry {} of {} is not a questionnaire", i, path.display()))?;
            Ok(ValuationRequest {
                id: format!("{}-{}", stem, i + 1),
                tier,
                analysis_type,
                data,
                urgency: Default::default(),
                options: Default::default(),
                decision_outcomes: Vec::new(),
            })
        })
        .collect()
}
