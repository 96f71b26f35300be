//! Scripted LLM provider
//!
//! Replays a queue of canned replies, tool requests and faults, and records every
//! request it receives. Useful for tests and offline demos.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use crate::agents::domain::{Message, ToolCall};
use crate::agents::error::{LlmError, LlmResult};

enum Step {
    Reply(String),
    ToolCalls(Vec<(String, Value)>),
    Fail(LlmError),
}

/// Deterministic provider driven by a script
pub struct ScriptedProvider {
    model: String,
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
    supports_tools: bool,
    reject_tools: bool,
    delay: Option<Duration>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            supports_tools: true,
            reject_tools: false,
            delay: None,
        }
    }

    /// Queue a plain text answer
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(Step::Reply(text.into()))
    }

    /// Queue a single tool request
    pub fn then_tool_call(self, name: impl Into<String>, arguments: Value) -> Self {
        self.push(Step::ToolCalls(vec![(name.into(), arguments)]))
    }

    /// Queue several tool requests in one model utterance
    pub fn then_tool_calls<S: Into<String>>(self, calls: Vec<(S, Value)>) -> Self {
        self.push(Step::ToolCalls(
            calls.into_iter().map(|(n, a)| (n.into(), a)).collect(),
        ))
    }

    /// Queue a fault
    pub fn then_error(self, error: LlmError) -> Self {
        self.push(Step::Fail(error))
    }

    /// Advertise (or not) tool-calling support
    pub fn with_tool_support(mut self, supported: bool) -> Self {
        self.supports_tools = supported;
        self
    }

    /// Fail every request that carries tools with `ToolsUnsupported`, without consuming a step
    pub fn rejecting_tools(mut self) -> Self {
        self.reject_tools = true;
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.steps).len()
    }

    fn push(self, step: Step) -> Self {
        lock(&self.steps).push_back(step);
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports_tools(&self) -> bool {
        self.supports_tools
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let carries_tools = request.has_tools();
        lock(&self.requests).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.reject_tools && carries_tools {
            return Err(LlmError::ToolsUnsupported(format!(
                "{} does not support tools",
                self.model
            )));
        }

        let step = lock(&self.steps).pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(CompletionResponse {
                message: Message::assistant(text),
                finish_reason: FinishReason::Stop,
                usage: None,
            }),
            Some(Step::ToolCalls(calls)) => {
                let calls = calls
                    .into_iter()
                    .map(|(name, args)| ToolCall::new(ToolCall::generate_id(), name, args))
                    .collect();
                Ok(CompletionResponse {
                    message: Message::assistant_with_tools("", calls),
                    finish_reason: FinishReason::ToolCalls,
                    usage: None,
                })
            }
            Some(Step::Fail(error)) => Err(error),
            None => Err(LlmError::InvalidRequest("script exhausted".to_string())),
        }
    }
}
