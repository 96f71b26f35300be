//! Error types for the travel agent
//!
//! Faults are split by the boundary they cross. `LlmError` comes from the completion
//! service, `ToolError` from a capability, `DeliveryError` from the email transport.
//! Only `AgentError` ever ends a round.

use serde_json::{json, Value};
use thiserror::Error;

/// Errors that end a round or reject a transition
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM provider error that could not be recovered by fallback
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The model kept requesting tools past the configured limit
    #[error("Max tool rounds ({0}) reached without a final answer")]
    MaxIterations(u32),

    /// Another round is already running on this thread
    #[error("Thread {0} already has a round in flight")]
    ThreadBusy(String),

    /// Thread has no checkpoint
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// Requested transition is not valid from the thread's current status
    #[error("Invalid transition for thread {thread_id}: thread is {status}")]
    InvalidTransition { thread_id: String, status: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Checkpoint persistence error
    #[error("Memory error: {0}")]
    Memory(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors specific to LLM provider operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// The selected model cannot perform structured tool invocation
    #[error("Model does not support tool calling: {0}")]
    ToolsUnsupported(String),

    /// API error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl LlmError {
    /// Whether this fault means "tool calling is unsupported for the selected model".
    pub fn is_capability_mismatch(&self) -> bool {
        matches!(self, LlmError::ToolsUnsupported(_))
    }
}

/// Faults raised by a capability tool. Converted into an error record at the loop boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    /// Arguments did not match the tool's input schema
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Arguments were well-formed but semantically invalid
    #[error("{0}")]
    Validation(String),

    /// Search, generation or other downstream service failed
    #[error("{0}")]
    Upstream(String),

    /// Invocation exceeded the configured timeout
    #[error("Tool timed out after {0}s")]
    Timeout(u64),

    /// The capability itself faulted
    #[error("Internal tool error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Structured error record handed back to the model
    pub fn to_record(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Faults from the outbound delivery collaborator
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Delivery is enabled but a credential or address is missing
    #[error("Delivery not configured: {0}")]
    NotConfigured(String),

    /// The transport answered with a non-success status
    #[error("Delivery rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Internal(format!("IO error: {}", err))
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
