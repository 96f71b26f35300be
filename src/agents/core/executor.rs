//! Tool execution for one `ExecutingTools` visit

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::tool_registry::ToolRegistry;
use crate::agents::domain::{ToolCall, ToolCallResult};
use crate::agents::error::ToolError;
use crate::agents::events::{AgentEvent, EventBus};
use crate::domain::Tool;

/// Runs requested tool calls concurrently and returns their results in request order.
///
/// Every fault (unknown name, bad arguments, downstream failure, timeout, panic) comes
/// back as an error-carrying `ToolCallResult`.
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
    events: EventBus,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout: Duration, events: EventBus) -> Self {
        Self {
            registry,
            timeout,
            events,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute_all(&self, thread_id: &str, calls: &[ToolCall]) -> Vec<ToolCallResult> {
        let pending = calls.iter().map(|call| self.execute_one(thread_id, call));
        join_all(pending).await
    }

    async fn execute_one(&self, thread_id: &str, call: &ToolCall) -> ToolCallResult {
        self.events.emit(AgentEvent::ToolCall {
            thread_id: thread_id.to_string(),
            call_id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        let start = Instant::now();
        let outcome = match self.registry.get(&call.name) {
            Some(tool) => self.invoke_isolated(tool, call.arguments.clone()).await,
            None => {
                warn!(thread_id, tool = %call.name, "Invalid tool name requested");
                Err(ToolError::Validation(format!(
                    "Invalid tool name: {}. Please retry.",
                    call.name
                )))
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(output) => ToolCallResult::success(call, output, elapsed_ms),
            Err(e) => {
                debug!(thread_id, tool = %call.name, error = %e, "Tool returned an error record");
                ToolCallResult::failure(call, &e, elapsed_ms)
            }
        };

        self.events.emit(AgentEvent::ToolResult {
            thread_id: thread_id.to_string(),
            call_id: call.id.clone(),
            name: call.name.clone(),
            success: result.success,
            execution_time_ms: elapsed_ms,
        });

        result
    }

    /// Run on its own task so a panicking capability cannot take the round down
    async fn invoke_isolated(&self, tool: Arc<dyn Tool>, args: Value) -> Result<Value, ToolError> {
        let timeout = self.timeout;
        let handle = tokio::spawn(async move { tokio::time::timeout(timeout, tool.invoke(args)).await });

        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(_elapsed)) => Err(ToolError::Timeout(timeout.as_secs())),
            Err(join_error) => Err(ToolError::Internal(join_error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Sleepy {
        name: &'static str,
        delay_ms: u64,
    }

    #[async_trait]
    impl Tool for Sleepy {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "sleeps"
        }
        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        async fn invoke(&self, _args: Value) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(json!({ "tool": self.name }))
        }
    }

    struct Panicky;

    #[async_trait]
    impl Tool for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }
        fn description(&self) -> &str {
            "panics"
        }
        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        async fn invoke(&self, _args: Value) -> Result<Value, ToolError> {
            panic!("capability bug");
        }
    }

    fn executor(timeout: Duration) -> ToolExecutor {
        let registry = ToolRegistry::builder()
            .register(Sleepy { name: "slow", delay_ms: 80 })
            .unwrap()
            .register(Sleepy { name: "fast", delay_ms: 1 })
            .unwrap()
            .register(Panicky)
            .unwrap()
            .build();
        ToolExecutor::new(registry, timeout, EventBus::default())
    }

    #[tokio::test]
    async fn test_results_keep_request_order() {
        let exec = executor(Duration::from_secs(5));
        let calls = vec![
            ToolCall::new("1", "slow", json!({})),
            ToolCall::new("2", "fast", json!({})),
            ToolCall::new("3", "nope", json!({})),
        ];

        let results = exec.execute_all("t", &calls).await;
        let ids: Vec<&str> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(results[0].success && results[1].success);
        assert_eq!(
            results[2].output,
            json!({ "error": "Invalid tool name: nope. Please retry." })
        );
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_record() {
        let exec = executor(Duration::from_millis(10));
        let results = exec
            .execute_all("t", &[ToolCall::new("1", "slow", json!({}))])
            .await;
        assert!(!results[0].success);
        assert!(results[0].output["error"]
            .as_str()
            .unwrap()
            .starts_with("Tool timed out"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let exec = executor(Duration::from_secs(5));
        let results = exec
            .execute_all(
                "t",
                &[
                    ToolCall::new("1", "panicky", json!({})),
                    ToolCall::new("2", "fast", json!({})),
                ],
            )
            .await;
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().starts_with("Internal tool error"));
        assert!(results[1].success);
    }
}
