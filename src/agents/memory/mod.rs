//! Checkpoint persistence for conversation threads
//!
//! Storage backends:
//! - In-memory (default, lost on restart)
//! - File-based (one JSON document per thread)

mod file;
mod in_memory;

pub use file::FileStore;
pub use in_memory::InMemoryStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::agents::config::{MemoryBackend, MemoryConfig};
use crate::agents::domain::{ThreadCheckpoint, ThreadSummary};
use crate::agents::error::AgentResult;

/// Trait for checkpoint storage backends, keyed by thread id
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Save (insert or replace) a checkpoint
    async fn save(&self, checkpoint: &ThreadCheckpoint) -> AgentResult<()>;

    /// Load a checkpoint by thread id
    async fn load(&self, thread_id: &str) -> AgentResult<Option<ThreadCheckpoint>>;

    /// Delete a checkpoint; deleting an absent thread is not an error
    async fn delete(&self, thread_id: &str) -> AgentResult<()>;

    /// List threads, most recently updated first
    async fn list(&self, limit: usize, offset: usize) -> AgentResult<Vec<ThreadSummary>>;
}

/// Create a checkpoint store from configuration
pub fn create_store(config: &MemoryConfig) -> AgentResult<Arc<dyn CheckpointStore>> {
    match config.backend {
        MemoryBackend::InMemory => Ok(Arc::new(InMemoryStore::new())),
        MemoryBackend::File => Ok(Arc::new(FileStore::new(&config.file_path)?)),
    }
}
