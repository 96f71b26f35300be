//! Operator-facing side channel
//!
//! A broadcast stream of what the agent is doing. Warnings that must not reach the
//! end user (model fallback, delivery failures) travel here and through `tracing`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

/// Event published on the side channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Non-fatal degradation the operator should know about
    Warning { thread_id: Option<String>, message: String },
    /// The model answered; `tool_calls` is the number of requested invocations
    ModelDecision { thread_id: String, tool_calls: usize },
    /// A tool invocation is starting
    ToolCall {
        thread_id: String,
        call_id: String,
        name: String,
        arguments: Value,
    },
    /// A tool invocation finished
    ToolResult {
        thread_id: String,
        call_id: String,
        name: String,
        success: bool,
        execution_time_ms: u64,
    },
    /// The round stopped at the finalization gate
    AwaitingApproval { thread_id: String },
    /// The delivery collaborator accepted the payload
    Delivered { thread_id: String, recipient: String },
    /// The delivery collaborator failed; the conversation is unaffected
    DeliveryFailed { thread_id: String, error: String },
    /// Finalization finished
    Finalized { thread_id: String },
}

/// Cloneable handle to the side channel
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscriber is fine.
    pub fn emit(&self, event: AgentEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    /// Log a warning and publish it
    pub fn warn(&self, thread_id: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        warn!(thread_id = thread_id.unwrap_or("-"), "{}", message);
        self.emit(AgentEvent::Warning {
            thread_id: thread_id.map(str::to_string),
            message,
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
