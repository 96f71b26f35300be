//! Tool call types for agent interactions

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::error::ToolError;

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque identifier correlating the request with its result
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Arguments passed to the tool (as JSON)
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Generate a unique ID for a tool call
    pub fn generate_id() -> String {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        format!("call_{}", &raw[..24])
    }
}

/// Result of executing one tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// ID of the tool call this is responding to
    pub tool_call_id: String,
    /// Name of the tool that was called
    pub tool_name: String,
    /// Output returned by the tool, or the error record on failure
    pub output: Value,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Error message if execution failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    /// Create a successful tool call result
    pub fn success(call: &ToolCall, output: Value, execution_time_ms: u64) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output,
            execution_time_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed tool call result; the output is the error record
    pub fn failure(call: &ToolCall, error: &ToolError, execution_time_ms: u64) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output: error.to_record(),
            execution_time_ms,
            success: false,
            error: Some(error.to_string()),
        }
    }

    /// Tool message to append to the conversation
    pub fn to_message(&self) -> super::Message {
        super::Message::tool_result(&self.tool_call_id, &self.tool_name, &self.output)
    }
}

/// Definition of a tool as advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema defining the tool's parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}
