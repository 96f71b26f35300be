//! Outcomes returned to callers of the agent

use serde::{Deserialize, Serialize};

use super::{ThreadStatus, ToolCallResult};
use crate::domain::{DeliveryPayload, DeliveryReceipt};

/// Orchestration loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    AwaitingModelDecision,
    ExecutingTools,
    AwaitingFinalizationGate,
    Finalized,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::AwaitingModelDecision => write!(f, "awaiting_model_decision"),
            LoopState::ExecutingTools => write!(f, "executing_tools"),
            LoopState::AwaitingFinalizationGate => write!(f, "awaiting_finalization_gate"),
            LoopState::Finalized => write!(f, "finalized"),
        }
    }
}

/// Result of one round driven by a user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub thread_id: String,
    /// The model's final answer for this round
    pub answer: String,
    /// Every tool invocation executed during the round, in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallResult>,
    /// Number of model decisions taken
    pub iterations: u32,
    /// States visited, in order
    pub stages: Vec<LoopState>,
    /// Thread status after the round
    pub status: ThreadStatus,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl RoundOutcome {
    /// How many times the loop entered `state`
    pub fn visits(&self, state: LoopState) -> usize {
        self.stages.iter().filter(|s| **s == state).count()
    }
}

/// What happened to the payload handed to the delivery collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent { receipt: DeliveryReceipt },
    Failed { error: String },
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryStatus::Sent { .. })
    }
}

/// Result of passing the finalization gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizationOutcome {
    pub thread_id: String,
    pub payload: DeliveryPayload,
    pub delivery: DeliveryStatus,
}
