//! Model adapter
//!
//! Wraps one provider with a system directive and a sampling temperature. `decide` uses
//! the tool-aware path and degrades to the base path for a single call when the model
//! cannot call tools.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::domain::{Message, Role, ToolDefinition};
use super::error::LlmResult;
use super::events::EventBus;
use super::llm::{CompletionRequest, LlmProvider, ToolChoice};

/// Provider plus the configuration of one model role
#[derive(Clone)]
pub struct ModelAdapter {
    provider: Arc<dyn LlmProvider>,
    system_directive: String,
    temperature: f32,
    max_tokens: Option<u32>,
    events: EventBus,
}

impl ModelAdapter {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_directive: impl Into<String>,
        temperature: f32,
        events: EventBus,
    ) -> Self {
        Self {
            provider,
            system_directive: system_directive.into(),
            temperature,
            max_tokens: None,
            events,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn system_directive(&self) -> &str {
        &self.system_directive
    }

    /// Ask the model what to do next given the history and the available tools.
    pub async fn decide(&self, history: &[Message], tools: &[ToolDefinition]) -> LlmResult<Message> {
        self.decide_in(None, history, tools).await
    }

    /// `decide`, attributing warnings to a thread
    #[instrument(skip(self, history, tools), fields(provider = %self.provider.name(), model = %self.provider.model()))]
    pub async fn decide_in(
        &self,
        thread_id: Option<&str>,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> LlmResult<Message> {
        if tools.is_empty() {
            return self.invoke_base(history).await;
        }

        if !self.provider.supports_tools() {
            self.events.warn(
                thread_id,
                format!(
                    "Model {} does not support tool calling; continuing without tools.",
                    self.provider.model()
                ),
            );
            return self.invoke_base(history).await;
        }

        let request = CompletionRequest {
            messages: self.with_directive(history.iter().cloned()),
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            tools: Some(tools.to_vec()),
            tool_choice: Some(ToolChoice::Auto),
            ..Default::default()
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                debug!(tool_calls = response.message.tool_calls().len(), "Model decided");
                Ok(response.message)
            }
            Err(e) if e.is_capability_mismatch() => {
                self.events.warn(
                    thread_id,
                    "Selected model does not support tool calling; continuing without tools.",
                );
                self.invoke_base(history).await
            }
            Err(e) => Err(e),
        }
    }

    /// Single-shot completion under this adapter's directive
    pub async fn complete_text(&self, user_prompt: &str) -> LlmResult<String> {
        let request = CompletionRequest {
            messages: self.with_directive(std::iter::once(Message::user(user_prompt))),
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            ..Default::default()
        };
        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }

    /// Base variant: no tools offered, tool traffic in the history flattened to text,
    /// and the answer guaranteed to carry no tool requests.
    async fn invoke_base(&self, history: &[Message]) -> LlmResult<Message> {
        let request = CompletionRequest {
            messages: self.with_directive(history.iter().cloned().map(flatten_tool_traffic)),
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            ..Default::default()
        };
        let response = self.provider.complete(request).await?;
        Ok(Message::assistant(response.message.content))
    }

    fn with_directive(&self, messages: impl Iterator<Item = Message>) -> Vec<Message> {
        std::iter::once(Message::system(self.system_directive.clone()))
            .chain(messages)
            .collect()
    }
}

/// Rewrite tool requests and results as plain text for a model without tool support
fn flatten_tool_traffic(message: Message) -> Message {
    match message.role {
        Role::Assistant if message.has_tool_calls() => {
            let requested = message
                .tool_calls()
                .iter()
                .map(|c| format!("{}({})", c.name, c.arguments))
                .collect::<Vec<_>>()
                .join(", ");
            let text = if message.content.is_empty() {
                format!("[requested tools: {}]", requested)
            } else {
                format!("{}\n[requested tools: {}]", message.content, requested)
            };
            Message::assistant(text)
        }
        Role::Tool => Message::user(format!(
            "[{} result]\n{}",
            message.name.as_deref().unwrap_or("tool"),
            message.content
        )),
        _ => message,
    }
}
