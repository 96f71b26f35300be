//! The orchestration loop
//!
//! One round: ask the model, run the tools it requests, feed the results back, until it
//! answers without tool requests. The answer then waits at the finalization gate until
//! `resume` (deliver) or `decline` (keep talking).

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument};

use super::executor::ToolExecutor;
use super::finalizer::Finalizer;
use crate::adapters::tool_registry::ToolRegistry;
use crate::agents::adapter::ModelAdapter;
use crate::agents::domain::{
    FinalizationOutcome, LoopState, Message, RoundOutcome, ThreadCheckpoint, ThreadStatus,
    ThreadSummary, ToolCall, ToolCallResult,
};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::events::{AgentEvent, EventBus};
use crate::agents::memory::CheckpointStore;

/// Loop limits
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    /// Maximum `ExecutingTools` visits per round
    pub max_tool_rounds: u32,
    /// Per-invocation tool timeout
    pub tool_timeout: Duration,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            tool_timeout: Duration::from_secs(60),
        }
    }
}

/// Conversational travel agent: owns the loop, the gate and the thread checkpoints
pub struct TravelAgent {
    model: ModelAdapter,
    executor: ToolExecutor,
    finalizer: Finalizer,
    store: Arc<dyn CheckpointStore>,
    events: EventBus,
    options: LoopOptions,
    in_flight: InFlight,
}

impl TravelAgent {
    pub fn new(
        model: ModelAdapter,
        registry: ToolRegistry,
        finalizer: Finalizer,
        store: Arc<dyn CheckpointStore>,
        events: EventBus,
        options: LoopOptions,
    ) -> Self {
        Self {
            model,
            executor: ToolExecutor::new(registry, options.tool_timeout, events.clone()),
            finalizer,
            store,
            events,
            options,
            in_flight: InFlight::default(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run one round for a user message.
    ///
    /// Nothing is written to the thread unless the round reaches the gate: on a fatal
    /// fault the checkpoint stays exactly as it was, user message included.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, thread_id: &str, text: &str) -> AgentResult<RoundOutcome> {
        let _lease = self.in_flight.try_acquire(thread_id)?;
        let start = Instant::now();

        let mut checkpoint = self
            .store
            .load(thread_id)
            .await?
            .unwrap_or_else(|| ThreadCheckpoint::new(thread_id));

        if checkpoint.status == ThreadStatus::AwaitingFinalizationGate {
            info!(thread_id, "New message abandons pending finalization");
        }

        let tools = self.executor.registry().definitions();
        let mut staged: Vec<Message> = vec![Message::user(text)];
        let mut stages: Vec<LoopState> = Vec::new();
        let mut executed: Vec<ToolCallResult> = Vec::new();
        let mut iterations: u32 = 0;
        let mut tool_visits: u32 = 0;

        let answer = loop {
            stages.push(LoopState::AwaitingModelDecision);
            iterations += 1;

            let history: Vec<Message> = checkpoint
                .conversation
                .messages()
                .iter()
                .chain(staged.iter())
                .cloned()
                .collect();

            let mut reply = self
                .model
                .decide_in(Some(thread_id), &history, &tools)
                .await?;
            assign_missing_call_ids(&mut reply);

            self.events.emit(AgentEvent::ModelDecision {
                thread_id: thread_id.to_string(),
                tool_calls: reply.tool_calls().len(),
            });

            if !reply.has_tool_calls() {
                let answer = reply.content.clone();
                staged.push(reply);
                stages.push(LoopState::AwaitingFinalizationGate);
                break answer;
            }

            if tool_visits >= self.options.max_tool_rounds {
                return Err(AgentError::MaxIterations(self.options.max_tool_rounds));
            }
            tool_visits += 1;
            stages.push(LoopState::ExecutingTools);

            let calls = reply.tool_calls().to_vec();
            staged.push(reply);

            let results = self.executor.execute_all(thread_id, &calls).await;
            staged.extend(results.iter().map(ToolCallResult::to_message));
            executed.extend(results);
        };

        checkpoint.conversation.extend(staged);
        checkpoint.mark(ThreadStatus::AwaitingFinalizationGate);
        self.store.save(&checkpoint).await?;

        self.events.emit(AgentEvent::AwaitingApproval {
            thread_id: thread_id.to_string(),
        });

        let execution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            thread_id,
            iterations,
            tool_calls = executed.len(),
            elapsed_ms = execution_time_ms,
            "Round reached finalization gate"
        );

        Ok(RoundOutcome {
            thread_id: thread_id.to_string(),
            answer,
            tool_calls: executed,
            iterations,
            stages,
            status: checkpoint.status,
            execution_time_ms,
        })
    }

    /// Resume signal: pass the gate, render the last answer and deliver it.
    ///
    /// A model fault while rendering leaves the thread at the gate so it can be retried.
    /// A delivery fault does not: it is reported in the outcome and the thread is finalized.
    #[instrument(skip(self))]
    pub async fn resume(&self, thread_id: &str) -> AgentResult<FinalizationOutcome> {
        let _lease = self.in_flight.try_acquire(thread_id)?;
        let mut checkpoint = self.gated_checkpoint(thread_id).await?;

        let answer = checkpoint
            .conversation
            .last_answer()
            .ok_or_else(|| AgentError::Internal(format!("Thread {} has no answer", thread_id)))?
            .to_string();

        let (payload, delivery) = self.finalizer.finalize(thread_id, &answer).await?;

        checkpoint.mark(ThreadStatus::Finalized);
        self.store.save(&checkpoint).await?;
        self.events.emit(AgentEvent::Finalized {
            thread_id: thread_id.to_string(),
        });

        Ok(FinalizationOutcome {
            thread_id: thread_id.to_string(),
            payload,
            delivery,
        })
    }

    /// Reject the gate without delivering; the thread returns to `Open`
    #[instrument(skip(self))]
    pub async fn decline(&self, thread_id: &str) -> AgentResult<ThreadStatus> {
        let _lease = self.in_flight.try_acquire(thread_id)?;
        let mut checkpoint = self.gated_checkpoint(thread_id).await?;

        checkpoint.mark(ThreadStatus::Open);
        self.store.save(&checkpoint).await?;
        info!(thread_id, "Finalization declined");

        Ok(checkpoint.status)
    }

    pub async fn thread(&self, thread_id: &str) -> AgentResult<Option<ThreadCheckpoint>> {
        self.store.load(thread_id).await
    }

    pub async fn threads(&self, limit: usize, offset: usize) -> AgentResult<Vec<ThreadSummary>> {
        self.store.list(limit, offset).await
    }

    async fn gated_checkpoint(&self, thread_id: &str) -> AgentResult<ThreadCheckpoint> {
        let checkpoint = self
            .store
            .load(thread_id)
            .await?
            .ok_or_else(|| AgentError::ThreadNotFound(thread_id.to_string()))?;

        if checkpoint.status != ThreadStatus::AwaitingFinalizationGate {
            return Err(AgentError::InvalidTransition {
                thread_id: thread_id.to_string(),
                status: checkpoint.status.to_string(),
            });
        }
        Ok(checkpoint)
    }
}

/// Per-thread locks for rounds in progress. An entry lives only while a lease on it exists.
#[derive(Default)]
struct InFlight {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InFlight {
    /// Single flight per thread: a second caller is rejected, not queued
    fn try_acquire(&self, thread_id: &str) -> AgentResult<ThreadLease<'_>> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = lock.try_lock_owned().map_err(|_| {
            self.release(thread_id);
            AgentError::ThreadBusy(thread_id.to_string())
        })?;
        Ok(ThreadLease {
            owner: self,
            thread_id: thread_id.to_string(),
            guard: Some(guard),
        })
    }

    /// Drop the entry when nothing but the map references it
    fn release(&self, thread_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(thread_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(thread_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct ThreadLease<'a> {
    owner: &'a InFlight,
    thread_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ThreadLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.owner.release(&self.thread_id);
    }
}

/// Providers that do not return call ids still need results correlated to requests
fn assign_missing_call_ids(reply: &mut Message) {
    if let Some(calls) = reply.tool_calls.as_mut() {
        for call in calls.iter_mut().filter(|c| c.id.is_empty()) {
            call.id = ToolCall::generate_id();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_entry_removed_on_release() {
        let in_flight = InFlight::default();
        {
            let _lease = in_flight.try_acquire("trip").unwrap();
            assert_eq!(in_flight.len(), 1);
        }
        assert_eq!(in_flight.len(), 0);
    }

    #[test]
    fn test_busy_thread_keeps_holder_entry() {
        let in_flight = InFlight::default();
        let lease = in_flight.try_acquire("trip").unwrap();

        let err = in_flight.try_acquire("trip").err().unwrap();
        assert!(matches!(err, AgentError::ThreadBusy(ref id) if id == "trip"));
        assert_eq!(in_flight.len(), 1);

        drop(lease);
        assert_eq!(in_flight.len(), 0);
        assert!(in_flight.try_acquire("trip").is_ok());
    }

    #[test]
    fn test_many_threads_leave_nothing_behind() {
        let in_flight = InFlight::default();
        for i in 0..100 {
            let _lease = in_flight.try_acquire(&format!("thread-{}", i)).unwrap();
        }
        assert_eq!(in_flight.len(), 0);
    }
}
