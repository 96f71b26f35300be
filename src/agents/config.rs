//! Configuration types for the travel agent

use serde::{Deserialize, Serialize};

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmProviderConfig {
    /// Provider type
    #[serde(default)]
    pub provider: LlmProviderType,
    /// Model name/identifier; left blank, the provider's default is used
    #[serde(default)]
    pub model: String,
    /// Environment variable containing the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Custom base URL (for self-hosted or proxied endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature for the tool-calling conversation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Default max tokens for completions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// HTTP timeout for a single completion call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderType::default(),
            model: LlmProviderType::default().default_model().to_string(),
            api_key_env: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl LlmProviderConfig {
    /// Fill a blank model with the provider's default
    pub fn fill_default_model(&mut self) {
        if self.model.trim().is_empty() {
            self.model = self.provider.default_model().to_string();
        }
    }

    /// Switch provider; a model that was only the old provider's default follows the switch
    pub fn switch_provider(&mut self, provider: LlmProviderType) {
        if self.model == self.provider.default_model() {
            self.model.clear();
        }
        self.provider = provider;
        self.fill_default_model();
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    120
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Google Gemini
    #[default]
    #[serde(alias = "google")]
    Gemini,
    /// Ollama (local models)
    Ollama,
    /// OpenAI or any compatible endpoint
    OpenAI,
}

impl LlmProviderType {
    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProviderType::Gemini => "gemini-flash-latest",
            LlmProviderType::Ollama => "llama3.1",
            LlmProviderType::OpenAI => "gpt-4o-mini",
        }
    }
}

impl std::fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderType::Gemini => write!(f, "gemini"),
            LlmProviderType::Ollama => write!(f, "ollama"),
            LlmProviderType::OpenAI => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for LlmProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProviderType::Gemini),
            "ollama" => Ok(LlmProviderType::Ollama),
            "openai" => Ok(LlmProviderType::OpenAI),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Orchestration loop settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Maximum `ExecutingTools` visits per round
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Per-invocation tool timeout
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_seconds: u64,
    /// Temperature of the HTML conversion call
    #[serde(default = "default_finalization_temperature")]
    pub finalization_temperature: f32,
    /// Temperature of the itinerary generation call
    #[serde(default = "default_itinerary_temperature")]
    pub itinerary_temperature: f32,
    /// Capacity of the operator event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            tool_timeout_seconds: default_tool_timeout(),
            finalization_temperature: default_finalization_temperature(),
            itinerary_temperature: default_itinerary_temperature(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_max_tool_rounds() -> u32 {
    8
}

fn default_tool_timeout() -> u64 {
    60
}

fn default_finalization_temperature() -> f32 {
    0.1
}

fn default_itinerary_temperature() -> f32 {
    0.7
}

fn default_event_buffer() -> usize {
    64
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryConfig {
    /// Storage backend type
    #[serde(default)]
    pub backend: MemoryBackend,
    /// Directory for file-based storage
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::InMemory,
            file_path: default_file_path(),
        }
    }
}

fn default_file_path() -> String {
    "data/threads".to_string()
}

/// Memory storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBackend {
    /// Store in memory only (lost on restart)
    #[default]
    InMemory,
    /// One JSON file per thread
    File,
}
