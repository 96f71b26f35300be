//! LLM provider implementations
//!
//! A unified completion interface over:
//! - Google Gemini
//! - Ollama (local models)
//! - OpenAI-compatible endpoints
//! - A scripted provider that replays canned responses

mod gemini;
mod ollama;
mod openai;
mod scripted;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use scripted::ScriptedProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::agents::config::{LlmProviderConfig, LlmProviderType};
use crate::agents::domain::{Message, ToolDefinition};
use crate::agents::error::{LlmError, LlmResult};

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Check if tool/function calling is supported
    fn supports_tools(&self) -> bool {
        true
    }

    /// Complete a request
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;
}

/// Request for LLM completion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Model to use (overrides provider default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Tools available for calling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool choice mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl CompletionRequest {
    /// Whether the request advertises at least one tool
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().map_or(false, |t| !t.is_empty())
    }
}

/// Tool choice mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Let the model decide
    Auto,
    /// Don't use tools
    None,
    /// Must use a tool
    Required,
}

/// Response from LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated message
    pub message: Message,
    /// Reason the completion stopped
    pub finish_reason: FinishReason,
    /// Token usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Reason completion stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop
    Stop,
    /// Hit max tokens
    Length,
    /// Tool call requested
    ToolCalls,
    /// Content filtered
    ContentFilter,
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Create an LLM provider from configuration
pub fn create_provider(config: &LlmProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    match config.provider {
        LlmProviderType::Gemini => {
            let provider = GeminiProvider::new(config)?;
            Ok(Arc::new(provider))
        }
        LlmProviderType::Ollama => {
            let provider = OllamaProvider::new(config)?;
            Ok(Arc::new(provider))
        }
        LlmProviderType::OpenAI => {
            let provider = OpenAiProvider::new(config)?;
            Ok(Arc::new(provider))
        }
    }
}

/// Shared HTTP client honouring the configured request timeout
pub(crate) fn http_client(config: &LlmProviderConfig) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .build()
        .map_err(|e| LlmError::Network(format!("Failed to build HTTP client: {}", e)))
}

/// Map a non-success completion-service reply to an `LlmError`.
///
/// This is the one place that inspects error text. Services that report an unsupported
/// tool-calling model only in prose are recognised here and become `ToolsUnsupported`.
/// Only request-rejection statuses (400, 404, 422) are read this way; auth, quota and
/// server faults keep their status classification whatever the body says.
pub fn classify_api_error(status: u16, body: &str) -> LlmError {
    match status {
        400 | 404 | 422 if mentions_tools_unsupported(body) => {
            LlmError::ToolsUnsupported(body.to_string())
        }
        401 | 403 => LlmError::Authentication(body.to_string()),
        429 => LlmError::RateLimited(body.to_string()),
        _ => LlmError::Api {
            status,
            message: body.to_string(),
        },
    }
}

fn mentions_tools_unsupported(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("does not support tools")
        || (lower.contains("tools") && lower.contains("support"))
        || lower.contains("function calling is not enabled")
}
