use super::tool_registry::{RegistryError, ToolRegistry};
use crate::agents::error::ToolError;
use crate::domain::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};

struct Named(&'static str);

#[async_trait]
impl Tool for Named {
    fn name(&self) -> &str {
        self.0
    }

    fn description(&self) -> &str {
        "test tool"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        Ok(json!({ "echo": args }))
    }
}

#[test]
fn test_definitions_sorted() {
    let registry = ToolRegistry::builder()
        .register(Named("hotels_finder"))
        .unwrap()
        .register(Named("build_itinerary"))
        .unwrap()
        .build();

    let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["build_itinerary", "hotels_finder"]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_duplicate_rejected() {
    let result = ToolRegistry::builder()
        .register(Named("hotels_finder"))
        .unwrap()
        .register(Named("hotels_finder"));
    assert_eq!(
        result.err(),
        Some(RegistryError::Duplicate("hotels_finder".to_string()))
    );
}

#[test]
fn test_non_identifier_rejected() {
    for bad in ["", "9lives", "hôtel", "has space"] {
        let result = ToolRegistry::builder().register(Named(bad));
        assert!(
            matches!(result, Err(RegistryError::InvalidName(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_lookup_and_invoke() {
    let registry = ToolRegistry::builder()
        .register(Named("echo"))
        .unwrap()
        .build();

    assert!(registry.get("missing").is_none());
    let tool = registry.get("echo").unwrap();
    let out = tool.invoke(json!({ "a": 1 })).await.unwrap();
    assert_eq!(out["echo"]["a"], 1);
}
