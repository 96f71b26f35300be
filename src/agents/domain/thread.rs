//! Conversation thread checkpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Conversation;

/// Where a thread stands between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    /// Ready for a new user message
    #[default]
    Open,
    /// Last round produced an answer; finalization waits for a resume signal
    AwaitingFinalizationGate,
    /// The last answer went through finalization
    Finalized,
}

impl std::fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadStatus::Open => write!(f, "open"),
            ThreadStatus::AwaitingFinalizationGate => write!(f, "awaiting_finalization_gate"),
            ThreadStatus::Finalized => write!(f, "finalized"),
        }
    }
}

/// Persisted state of one conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadCheckpoint {
    pub thread_id: String,
    pub conversation: Conversation,
    #[serde(default)]
    pub status: ThreadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadCheckpoint {
    /// Fresh, empty thread
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            conversation: Conversation::new(),
            status: ThreadStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the status and bump `updated_at`
    pub fn mark(&mut self, status: ThreadStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            thread_id: self.thread_id.clone(),
            status: self.status,
            message_count: self.conversation.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub status: ThreadStatus,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
