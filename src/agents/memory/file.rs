//! File-based checkpoint store

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use super::CheckpointStore;
use crate::agents::domain::{ThreadCheckpoint, ThreadSummary};
use crate::agents::error::{AgentError, AgentResult};

/// One pretty-printed JSON file per thread under `base_path`
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store
    pub fn new(base_path: impl Into<PathBuf>) -> AgentResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path)
            .map_err(|e| AgentError::Memory(format!("Failed to create directory: {}", e)))?;

        Ok(Self { base_path })
    }

    fn thread_path(&self, thread_id: &str) -> AgentResult<PathBuf> {
        let valid = !thread_id.is_empty()
            && thread_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !thread_id.starts_with('.');
        if !valid {
            return Err(AgentError::Memory(format!(
                "Thread id not usable as a file name: {:?}",
                thread_id
            )));
        }
        Ok(self.base_path.join(format!("{}.json", thread_id)))
    }
}

#[async_trait]
impl CheckpointStore for FileStore {
    async fn save(&self, checkpoint: &ThreadCheckpoint) -> AgentResult<()> {
        let path = self.thread_path(&checkpoint.thread_id)?;
        let content = serde_json::to_string_pretty(checkpoint)?;

        // Write then rename so a crash never leaves a truncated checkpoint
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| AgentError::Memory(format!("Failed to write checkpoint file: {}", e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| AgentError::Memory(format!("Failed to replace checkpoint file: {}", e)))?;

        Ok(())
    }

    async fn load(&self, thread_id: &str) -> AgentResult<Option<ThreadCheckpoint>> {
        let path = self.thread_path(thread_id)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| AgentError::Memory(format!("Failed to read checkpoint file: {}", e)))?;

        let checkpoint: ThreadCheckpoint = serde_json::from_str(&content)?;
        Ok(Some(checkpoint))
    }

    async fn delete(&self, thread_id: &str) -> AgentResult<()> {
        let path = self.thread_path(thread_id)?;

        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                AgentError::Memory(format!("Failed to delete checkpoint file: {}", e))
            })?;
        }

        Ok(())
    }

    async fn list(&self, limit: usize, offset: usize) -> AgentResult<Vec<ThreadSummary>> {
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| AgentError::Memory(format!("Failed to read directory: {}", e)))?;

        let mut summaries = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AgentError::Memory(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "json") {
                if let Ok(content) = fs::read_to_string(&path).await {
                    if let Ok(checkpoint) = serde_json::from_str::<ThreadCheckpoint>(&content) {
                        summaries.push(checkpoint.summary());
                    }
                }
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(summaries.into_iter().skip(offset).take(limit).collect())
    }
}
