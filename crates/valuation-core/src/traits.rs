use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ValuationResult;

/// Prompt sent to the LLM collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub model: String,
    pub max_output_tokens: usize,
    pub temperature: f64,
}

/// Raw completion returned by the LLM collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: Option<usize>,
    pub output_tokens: Option<usize>,
    pub latency_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Backend-agnostic interface for the external LLM that performs the analysis.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> ValuationResult<CompletionResponse>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl AnalysisProvider for EchoProvider {
        async fn complete(&self, request: &CompletionRequest) -> ValuationResult<CompletionResponse> {
            Ok(CompletionResponse {
                content: request.prompt.clone(),
                model: request.model.clone(),
                input_tokens: None,
                output_tokens: None,
                latency_ms: 0,
                completed_at: Utc::now(),
            })
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_provider_trait_object() {
        let provider: Box<dyn AnalysisProvider> = Box::new(EchoProvider);
        let request = CompletionRequest {
            prompt: "hello".to_string(),
            system: None,
            model: "gpt-4".to_string(),
            max_output_tokens: 100,
            temperature: 0.2,
        };
        let response = provider.complete(&request).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(provider.name(), "echo");
    }
}
