mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use wayfarer::agents::config::{LlmProviderConfig, LlmProviderType};
use wayfarer::agents::error::LlmError;
use wayfarer::agents::llm::{
    CompletionRequest, GeminiProvider, LlmProvider, OllamaProvider, OpenAiProvider,
};
use wayfarer::agents::{AgentEvent, EventBus, Message, ModelAdapter, ToolDefinition};

type Recorded = Arc<Mutex<Vec<Value>>>;

fn hotels_tool() -> ToolDefinition {
    ToolDefinition::new(
        "hotels_finder",
        "Find hotels",
        json!({
            "type": "object",
            "properties": {
                "params": {
                    "type": "object",
                    "properties": { "q": { "type": "string" } },
                    "required": ["q"],
                    "additionalProperties": false
                }
            },
            "required": ["params"]
        }),
    )
}

fn config(provider: LlmProviderType, model: &str, base_url: String) -> LlmProviderConfig {
    LlmProviderConfig {
        provider,
        model: model.to_string(),
        base_url: Some(base_url),
        ..LlmProviderConfig::default()
    }
}

async fn gemini_handler(
    State(recorded): State<Recorded>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.lock().unwrap().push(json!({ "key": query.get("key"), "body": body }));
    Json(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "functionCall": { "name": "hotels_finder", "args": { "params": { "q": "Lisbon" } } }
                }]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16 }
    }))
}

#[tokio::test]
async fn test_gemini_function_call_round_trip() {
    let recorded: Recorded = Arc::default();
    let router = Router::new()
        .route("/models/*rest", post(gemini_handler))
        .with_state(recorded.clone());
    let base = common::serve(router).await;

    let provider = GeminiProvider::with_api_key(
        &config(LlmProviderType::Gemini, "gemini-2.5-flash", base),
        "test-key",
    )
    .unwrap();

    let response = provider
        .complete(CompletionRequest {
            messages: vec![Message::system("You plan trips."), Message::user("Hotels in Lisbon")],
            temperature: Some(0.7),
            tools: Some(vec![hotels_tool()]),
            ..Default::default()
        })
        .await
        .unwrap();

    let calls = response.message.tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "hotels_finder");
    assert_eq!(calls[0].arguments, json!({ "params": { "q": "Lisbon" } }));
    assert!(!calls[0].id.is_empty());

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded[0]["key"], "test-key");
    let body = &recorded[0]["body"];
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You plan trips.");
    let declaration = &body["tools"][0]["functionDeclarations"][0];
    assert_eq!(declaration["name"], "hotels_finder");
    // Unsupported schema keywords are stripped for Gemini
    assert!(declaration["parameters"]["properties"]["params"]
        .get("additionalProperties")
        .is_none());
}

async fn ollama_handler(Json(body): Json<Value>) -> Response {
    if body.get("tools").is_some() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "registry.ollama.ai/library/gemma:2b does not support tools" })),
        )
            .into_response();
    }
    Json(json!({
        "model": "gemma:2b",
        "message": { "role": "assistant", "content": "Lisbon is lovely in May." },
        "done": true
    }))
    .into_response()
}

#[tokio::test]
async fn test_ollama_tools_unsupported_is_classified() {
    let base = common::serve(Router::new().route("/api/chat", post(ollama_handler))).await;
    let provider = OllamaProvider::new(&config(LlmProviderType::Ollama, "gemma:2b", base)).unwrap();

    let err = provider
        .complete(CompletionRequest {
            messages: vec![Message::user("hi")],
            tools: Some(vec![hotels_tool()]),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::ToolsUnsupported(_)));
}

#[tokio::test]
async fn test_adapter_falls_back_for_ollama_model_without_tools() {
    let base = common::serve(Router::new().route("/api/chat", post(ollama_handler))).await;
    let provider = OllamaProvider::new(&config(LlmProviderType::Ollama, "gemma:2b", base)).unwrap();
    let events = EventBus::new(16);
    let mut rx = events.subscribe();

    let adapter = ModelAdapter::new(Arc::new(provider), "You plan trips.", 0.7, events);
    let reply = adapter
        .decide_in(Some("trip"), &[Message::user("Weather in Lisbon?")], &[hotels_tool()])
        .await
        .unwrap();

    assert_eq!(reply.content, "Lisbon is lovely in May.");
    assert!(!reply.has_tool_calls());
    assert!(matches!(rx.try_recv(), Ok(AgentEvent::Warning { .. })));
}

async fn openai_handler(Json(body): Json<Value>) -> Response {
    if body["messages"][0]["content"] == "bad key" {
        return (StatusCode::UNAUTHORIZED, "Incorrect API key provided").into_response();
    }
    Json(json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": { "name": "hotels_finder", "arguments": "{\"params\":{\"q\":\"Porto\"}}" }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    }))
    .into_response()
}

#[tokio::test]
async fn test_openai_tool_calls_and_auth_errors() {
    let base = common::serve(Router::new().route("/chat/completions", post(openai_handler))).await;
    let provider =
        OpenAiProvider::with_api_key(&config(LlmProviderType::OpenAI, "gpt-4o-mini", base), "sk-test")
            .unwrap();

    let response = provider
        .complete(CompletionRequest {
            messages: vec![Message::user("Hotels in Porto")],
            tools: Some(vec![hotels_tool()]),
            ..Default::default()
        })
        .await
        .unwrap();
    let calls = response.message.tool_calls();
    assert_eq!(calls[0].id, "call_abc");
    assert_eq!(calls[0].arguments["params"]["q"], "Porto");
    assert_eq!(response.usage.unwrap().total_tokens, 15);

    let err = provider
        .complete(CompletionRequest {
            messages: vec![Message::user("bad key")],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Authentication(_)));
}
