use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::domain::ToolDefinition;
use crate::agents::error::{DeliveryError, ToolError};

/// A capability the model may ask to invoke.
///
/// `invoke` validates its input before any external call and reports every fault,
/// downstream or semantic, as a `ToolError`; it never panics on bad input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable ASCII identifier, unique within a registry
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the accepted arguments
    fn input_schema(&self) -> Value;

    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Document handed to the delivery collaborator
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeliveryPayload {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Acknowledgement from the delivery collaborator
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeliveryReceipt {
    /// Transport status code, when the transport has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Transport-assigned message id, when returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

#[async_trait]
pub trait DeliveryPort: Send + Sync {
    async fn send(&self, payload: &DeliveryPayload) -> Result<DeliveryReceipt, DeliveryError>;
}
