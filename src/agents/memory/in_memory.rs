//! In-memory checkpoint store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::CheckpointStore;
use crate::agents::domain::{ThreadCheckpoint, ThreadSummary};
use crate::agents::error::AgentResult;

/// In-memory checkpoint store
#[derive(Default)]
pub struct InMemoryStore {
    threads: Arc<RwLock<HashMap<String, ThreadCheckpoint>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryStore {
    async fn save(&self, checkpoint: &ThreadCheckpoint) -> AgentResult<()> {
        let mut threads = self.threads.write().await;
        threads.insert(checkpoint.thread_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> AgentResult<Option<ThreadCheckpoint>> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned())
    }

    async fn delete(&self, thread_id: &str) -> AgentResult<()> {
        let mut threads = self.threads.write().await;
        threads.remove(thread_id);
        Ok(())
    }

    async fn list(&self, limit: usize, offset: usize) -> AgentResult<Vec<ThreadSummary>> {
        let threads = self.threads.read().await;

        let mut summaries: Vec<ThreadSummary> = threads.values().map(|t| t.summary()).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(summaries.into_iter().skip(offset).take(limit).collect())
    }
}
