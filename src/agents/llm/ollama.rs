//! Ollama LLM Provider (for local models)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    classify_api_error, http_client, CompletionRequest, CompletionResponse, FinishReason,
    LlmProvider, TokenUsage,
};
use crate::agents::config::LlmProviderConfig;
use crate::agents::domain::{Message, ToolCall};
use crate::agents::error::{LlmError, LlmResult};

/// Ollama LLM Provider (for local models)
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    default_temperature: f32,
    default_max_tokens: Option<u32>,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration
    pub fn new(config: &LlmProviderConfig) -> LlmResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            client: http_client(config)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            default_temperature: config.temperature,
            default_max_tokens: config.max_tokens,
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": request.model.as_ref().unwrap_or(&self.model),
            "messages": convert_messages(&request.messages),
            "stream": false,
            "options": {
                "temperature": request.temperature.unwrap_or(self.default_temperature),
            }
        });

        if let Some(max_tokens) = request.max_tokens.or(self.default_max_tokens) {
            body["options"]["num_predict"] = json!(max_tokens);
        }

        if let Some(tools) = &request.tools {
            if !tools.is_empty() {
                body["tools"] = json!(tools
                    .iter()
                    .map(|t| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters
                            }
                        })
                    })
                    .collect::<Vec<_>>());
            }
        }

        body
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status.as_u16(), &error_text));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        let tool_calls: Vec<ToolCall> = ollama_response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(ToolCall::generate_id(), tc.function.name, tc.function.arguments))
            .collect();

        let finish_reason = if !tool_calls.is_empty() {
            FinishReason::ToolCalls
        } else if ollama_response.done {
            FinishReason::Stop
        } else {
            FinishReason::Length
        };

        let prompt_tokens = ollama_response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = ollama_response.eval_count.unwrap_or(0);

        Ok(CompletionResponse {
            message: Message::assistant_with_tools(ollama_response.message.content, tool_calls),
            finish_reason,
            usage: Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }
}

fn convert_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let mut msg = json!({
                "role": m.role.to_string(),
                "content": m.content,
            });
            if m.has_tool_calls() {
                msg["tool_calls"] = json!(m
                    .tool_calls()
                    .iter()
                    .map(|tc| json!({ "function": { "name": tc.name, "arguments": tc.arguments } }))
                    .collect::<Vec<_>>());
            }
            if let Some(name) = &m.name {
                msg["tool_name"] = json!(name);
            }
            msg
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}
