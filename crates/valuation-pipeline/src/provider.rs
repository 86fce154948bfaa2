use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use valuation_core::{AnalysisProvider, CompletionRequest, CompletionResponse, ValuationError, ValuationResult};

use crate::config::PipelineConfig;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    ServiceUnavailable { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ProviderError> for ValuationError {
    fn from(err: ProviderError) -> Self {
        ValuationError::Provider(err.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<usize>,
    completion_tokens: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct HttpAnalysisProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAnalysisProvider {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> ProviderResult<Self> {
        Self::new(config.api_url.clone(), config.api_key.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let body = chat_body(request);
        let started = Instant::now();

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LLM request rejected");
            return Err(ProviderError::ServiceUnavailable {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let latency_ms = started.elapsed().as_millis() as u64;
        let completion = parse_chat_response(&text, &request.model, latency_ms)?;

        info!(
            model = %completion.model,
            latency_ms,
            input_tokens = ?completion.input_tokens,
            output_tokens = ?completion.output_tokens,
            "LLM completion received"
        );
        Ok(completion)
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    async fn complete(&self, request: &CompletionRequest) -> ValuationResult<CompletionResponse> {
        debug!(model = %request.model, chars = request.prompt.len(), "Sending completion request");
        Ok(self.chat(request).await?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn chat_body(request: &CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.clone(),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: request.prompt.clone(),
    });

    ChatRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature,
        max_tokens: request.max_output_tokens,
    }
}

fn parse_chat_response(text: &str, requested_model: &str, latency_ms: u64) -> ProviderResult<CompletionResponse> {
    let parsed: ChatResponse = serde_json::from_str(text)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("no choices in completion".to_string()))?;

    let usage = parsed.usage;
    Ok(CompletionResponse {
        content: choice.message.content,
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        input_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
        output_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
        latency_ms,
        completed_at: Utc::now(),
    })
}
