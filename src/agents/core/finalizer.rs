//! Finalization step: last answer to HTML document to delivery collaborator

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::agents::adapter::ModelAdapter;
use crate::agents::domain::DeliveryStatus;
use crate::agents::error::LlmResult;
use crate::agents::events::{AgentEvent, EventBus};
use crate::domain::{DeliveryPayload, DeliveryPort};

/// Sender, recipient and subject for every outgoing document
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
}

pub struct Finalizer {
    model: ModelAdapter,
    envelope: Envelope,
    delivery: Arc<dyn DeliveryPort>,
    events: EventBus,
}

impl Finalizer {
    /// `model` should carry the HTML conversion directive and a low temperature
    pub fn new(
        model: ModelAdapter,
        envelope: Envelope,
        delivery: Arc<dyn DeliveryPort>,
        events: EventBus,
    ) -> Self {
        Self {
            model,
            envelope,
            delivery,
            events,
        }
    }

    /// Convert the answer into a payload. A model fault here is returned to the caller.
    pub async fn render(&self, last_answer: &str) -> LlmResult<DeliveryPayload> {
        let html = self.model.complete_text(last_answer).await?;
        Ok(DeliveryPayload {
            sender: self.envelope.sender.clone(),
            recipient: self.envelope.recipient.clone(),
            subject: self.envelope.subject.clone(),
            html_body: strip_code_fence(&html),
        })
    }

    /// Render and hand off. Delivery faults are logged and reported, never raised.
    #[instrument(skip(self, last_answer))]
    pub async fn finalize(
        &self,
        thread_id: &str,
        last_answer: &str,
    ) -> LlmResult<(DeliveryPayload, DeliveryStatus)> {
        let payload = self.render(last_answer).await?;

        let status = match self.delivery.send(&payload).await {
            Ok(receipt) => {
                info!(thread_id, recipient = %payload.recipient, "Trip summary delivered");
                self.events.emit(AgentEvent::Delivered {
                    thread_id: thread_id.to_string(),
                    recipient: payload.recipient.clone(),
                });
                DeliveryStatus::Sent { receipt }
            }
            Err(e) => {
                error!(thread_id, error = %e, "Error sending email");
                self.events.emit(AgentEvent::DeliveryFailed {
                    thread_id: thread_id.to_string(),
                    error: e.to_string(),
                });
                DeliveryStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok((payload, status))
    }
}

/// Remove a Markdown code fence wrapped around the document, if the model added one
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return String::new(),
    };
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
        .to_string()
}
