use super::itinerary_builder::{ItineraryBuilder, ItineraryInput};
use crate::agents::adapter::ModelAdapter;
use crate::agents::error::LlmError;
use crate::agents::events::EventBus;
use crate::agents::llm::ScriptedProvider;
use crate::agents::prompts::ITINERARY_SYSTEM_PROMPT;
use crate::domain::Tool;
use serde_json::{json, Value};
use std::sync::Arc;

fn builder(provider: Arc<ScriptedProvider>) -> ItineraryBuilder {
    ItineraryBuilder::new(ModelAdapter::new(
        provider,
        ITINERARY_SYSTEM_PROMPT,
        0.7,
        EventBus::default(),
    ))
}

#[tokio::test]
async fn test_zero_days_makes_no_model_call() {
    let provider = Arc::new(ScriptedProvider::new().then_reply("never"));
    let err = builder(provider.clone())
        .invoke(json!({ "params": { "destination": "Goa", "days": 0 } }))
        .await
        .unwrap_err();

    assert_eq!(err.to_record(), json!({ "error": "days must be >= 1" }));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_negative_days_rejected() {
    let provider = Arc::new(ScriptedProvider::new());
    let err = builder(provider.clone())
        .invoke(json!({ "params": { "destination": "Goa", "days": -2 } }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "days must be >= 1");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_generates_markdown_with_directive() {
    let provider = Arc::new(ScriptedProvider::new().then_reply("# Day 1\n- 09:00 Gardens"));
    let result = builder(provider.clone())
        .invoke(json!({ "params": {
            "destination": "Singapore",
            "days": 3,
            "travelers": 2,
            "interests": ["food", "nature"]
        }}))
        .await
        .unwrap();

    assert_eq!(result, Value::String("# Day 1\n- 09:00 Gardens".into()));

    let request = &provider.requests()[0];
    assert_eq!(request.messages[0].content, ITINERARY_SYSTEM_PROMPT);
    assert!(!request.has_tools());
    assert_eq!(request.temperature, Some(0.7));
    let prompt = &request.messages[1].content;
    assert!(prompt.starts_with("Build a 3-day itinerary for Singapore for 2 travelers."));
    assert!(prompt.contains("Interests: food, nature."));
}

#[tokio::test]
async fn test_model_failure_becomes_error_record() {
    let provider = Arc::new(ScriptedProvider::new().then_error(LlmError::Network("down".into())));
    let err = builder(provider)
        .invoke(json!({ "params": { "destination": "Dubai", "days": 2 } }))
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .starts_with("Error generating itinerary: Network error: down"));
}

#[test]
fn test_prompt_defaults() {
    let input = ItineraryInput {
        destination: "Goa".into(),
        days: 3,
        travelers: None,
        interests: Some(vec![]),
    };
    let prompt = ItineraryBuilder::user_prompt(&input);
    assert!(prompt.contains("for the traveler(s)"));
    assert!(prompt.contains("Interests: none specified."));
}
