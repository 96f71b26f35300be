//! Google Gemini LLM Provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::env;
use tracing::warn;

use super::{
    classify_api_error, http_client, CompletionRequest, CompletionResponse, FinishReason,
    LlmProvider, TokenUsage, ToolChoice,
};
use crate::agents::config::LlmProviderConfig;
use crate::agents::domain::{Message, Role, ToolCall};
use crate::agents::error::{LlmError, LlmResult};

/// Model identifiers this provider accepts
pub const SUPPORTED_MODELS: &[&str] = &[
    "gemini-flash-latest",
    "gemini-pro-latest",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
];

const DEFAULT_MODEL: &str = "gemini-flash-latest";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Schema keywords understood by the function declaration subset of OpenAPI
const SCHEMA_KEYWORDS: &[&str] = &[
    "type",
    "description",
    "properties",
    "required",
    "items",
    "enum",
    "nullable",
];

/// Google Gemini LLM Provider
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    default_temperature: f32,
    default_max_tokens: Option<u32>,
}

impl GeminiProvider {
    /// Create a new Gemini provider from configuration.
    ///
    /// The key comes from `api_key_env` when set, otherwise `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    pub fn new(config: &LlmProviderConfig) -> LlmResult<Self> {
        let api_key = match &config.api_key_env {
            Some(env_var) => env::var(env_var).map_err(|_| {
                LlmError::Authentication(format!("Environment variable {} not set", env_var))
            })?,
            None => env::var("GOOGLE_API_KEY")
                .or_else(|_| env::var("GEMINI_API_KEY"))
                .map_err(|_| {
                    LlmError::Authentication(
                        "GOOGLE_API_KEY environment variable not set".to_string(),
                    )
                })?,
        };

        Self::with_api_key(config, api_key)
    }

    /// Create a provider with an explicit API key
    pub fn with_api_key(config: &LlmProviderConfig, api_key: impl Into<String>) -> LlmResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client: http_client(config)?,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: resolve_model(&config.model),
            default_temperature: config.temperature,
            default_max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let (system, contents) = convert_messages(&request.messages);
        let mut body = json!({ "contents": contents });

        if let Some(system) = system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let mut generation_config = json!({
            "temperature": request.temperature.unwrap_or(self.default_temperature),
        });
        if let Some(max_tokens) = request.max_tokens.or(self.default_max_tokens) {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        body["generationConfig"] = generation_config;

        if let Some(tools) = &request.tools {
            if !tools.is_empty() {
                body["tools"] = json!([{
                    "functionDeclarations": tools.iter().map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.description,
                            "parameters": sanitize_schema(&t.parameters)
                        })
                    }).collect::<Vec<_>>()
                }]);
            }
        }

        if let Some(tool_choice) = &request.tool_choice {
            let mode = match tool_choice {
                ToolChoice::Auto => "AUTO",
                ToolChoice::None => "NONE",
                ToolChoice::Required => "ANY",
            };
            body["toolConfig"] = json!({ "functionCallingConfig": { "mode": mode } });
        }

        body
    }

    /// Parse a response
    fn parse_response(&self, response: GeminiResponse) -> LlmResult<CompletionResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No candidates in response".to_string()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.and_then(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(ToolCall::new(
                    ToolCall::generate_id(),
                    fc.name,
                    fc.args.unwrap_or_else(|| Value::Object(Map::new())),
                ));
            }
        }

        let finish_reason = if !tool_calls.is_empty() {
            FinishReason::ToolCalls
        } else {
            match candidate.finish_reason.as_deref() {
                Some("MAX_TOKENS") => FinishReason::Length,
                Some("SAFETY") | Some("RECITATION") => FinishReason::ContentFilter,
                _ => FinishReason::Stop,
            }
        };

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count.unwrap_or(0),
            completion_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count.unwrap_or(0),
        });

        Ok(CompletionResponse {
            message: Message::assistant_with_tools(content, tool_calls),
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let body = self.build_request_body(&request);
        let model = request.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status.as_u16(), &error_text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        self.parse_response(gemini_response)
    }
}

/// Fall back to the default model for identifiers outside the supported set
fn resolve_model(requested: &str) -> String {
    if SUPPORTED_MODELS.contains(&requested) {
        requested.to_string()
    } else {
        warn!(
            requested,
            fallback = DEFAULT_MODEL,
            "Unsupported Gemini model, falling back"
        );
        DEFAULT_MODEL.to_string()
    }
}

/// Split the history into a system instruction and Gemini `contents`.
///
/// Consecutive tool results are grouped into one user turn, as Gemini expects every
/// `functionResponse` of a round in the turn that follows the `functionCall`s.
fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system: Vec<&str> = Vec::new();
    let mut contents: Vec<Value> = Vec::new();
    let mut pending_responses: Vec<Value> = Vec::new();

    for m in messages {
        if m.role != Role::Tool && !pending_responses.is_empty() {
            contents.push(json!({ "role": "user", "parts": std::mem::take(&mut pending_responses) }));
        }

        match m.role {
            Role::System => system.push(&m.content),
            Role::User => {
                contents.push(json!({ "role": "user", "parts": [{ "text": m.content }] }));
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if !m.content.is_empty() {
                    parts.push(json!({ "text": m.content }));
                }
                for tc in m.tool_calls() {
                    parts.push(json!({
                        "functionCall": { "name": tc.name, "args": tc.arguments }
                    }));
                }
                if !parts.is_empty() {
                    contents.push(json!({ "role": "model", "parts": parts }));
                }
            }
            Role::Tool => {
                let name = m.name.clone().unwrap_or_else(|| "tool".to_string());
                let response = match serde_json::from_str::<Value>(&m.content) {
                    Ok(Value::Object(obj)) => Value::Object(obj),
                    Ok(other) => json!({ "result": other }),
                    Err(_) => json!({ "result": m.content }),
                };
                pending_responses.push(json!({
                    "functionResponse": { "name": name, "response": response }
                }));
            }
        }
    }

    if !pending_responses.is_empty() {
        contents.push(json!({ "role": "user", "parts": pending_responses }));
    }

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };
    (system, contents)
}

/// Reduce a JSON Schema to the subset Gemini function declarations accept.
///
/// `["T", "null"]` type unions become `"type": "T", "nullable": true`.
pub(crate) fn sanitize_schema(schema: &Value) -> Value {
    let obj = match schema {
        Value::Object(obj) => obj,
        other => return other.clone(),
    };

    let mut out = Map::new();
    for (key, value) in obj {
        if !SCHEMA_KEYWORDS.contains(&key.as_str()) {
            continue;
        }
        match key.as_str() {
            "type" => match value {
                Value::Array(types) => {
                    let non_null: Vec<&Value> =
                        types.iter().filter(|t| t.as_str() != Some("null")).collect();
                    if let Some(first) = non_null.first() {
                        out.insert("type".to_string(), (*first).clone());
                    }
                    if non_null.len() < types.len() {
                        out.insert("nullable".to_string(), Value::Bool(true));
                    }
                }
                other => {
                    out.insert("type".to_string(), other.clone());
                }
            },
            "properties" => {
                let props = value
                    .as_object()
                    .map(|p| {
                        p.iter()
                            .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                            .collect::<Map<String, Value>>()
                    })
                    .unwrap_or_default();
                out.insert("properties".to_string(), Value::Object(props));
            }
            "items" => {
                out.insert("items".to_string(), sanitize_schema(value));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    Value::Object(out)
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}
