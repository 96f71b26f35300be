mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use wayfarer::adapters::sendgrid::SendGridDelivery;
use wayfarer::agents::error::DeliveryError;
use wayfarer::config::EmailConfig;
use wayfarer::domain::{DeliveryPayload, DeliveryPort};

type Recorded = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn mail_send(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    recorded.lock().unwrap().push((auth.clone(), body));

    if auth.as_deref() != Some("Bearer SG.good") {
        return (StatusCode::UNAUTHORIZED, r#"{"errors":[{"message":"bad key"}]}"#).into_response();
    }
    (StatusCode::ACCEPTED, [("x-message-id", "abc123")]).into_response()
}

fn payload() -> DeliveryPayload {
    DeliveryPayload {
        sender: "planner@example.com".to_string(),
        recipient: "traveller@example.com".to_string(),
        subject: "Trip to Lisbon".to_string(),
        html_body: "<html><body>Day 1</body></html>".to_string(),
    }
}

async fn sendgrid(key: &str) -> (SendGridDelivery, Recorded) {
    let recorded: Recorded = Arc::default();
    let router = Router::new()
        .route("/v3/mail/send", post(mail_send))
        .with_state(recorded.clone());
    let base_url = common::serve(router).await;

    let config = EmailConfig {
        enabled: true,
        base_url,
        api_key_env: "WAYFARER_TEST_UNSET_SENDGRID_KEY".to_string(),
        ..EmailConfig::default()
    };
    let delivery = SendGridDelivery::from_config(&config).unwrap().with_api_key(key);
    (delivery, recorded)
}

#[tokio::test]
async fn test_sendgrid_accepts_payload() {
    let (delivery, recorded) = sendgrid("SG.good").await;

    let receipt = delivery.send(&payload()).await.unwrap();
    assert_eq!(receipt.status, Some(202));
    assert_eq!(receipt.message_id.as_deref(), Some("abc123"));

    let recorded = recorded.lock().unwrap();
    let (_, body) = &recorded[0];
    assert_eq!(body["personalizations"][0]["to"][0]["email"], "traveller@example.com");
    assert_eq!(body["from"]["email"], "planner@example.com");
    assert_eq!(body["subject"], "Trip to Lisbon");
    assert_eq!(body["content"][0]["type"], "text/html");
    assert_eq!(body["content"][0]["value"], "<html><body>Day 1</body></html>");
}

#[tokio::test]
async fn test_sendgrid_rejection_carries_status() {
    let (delivery, _) = sendgrid("SG.bad").await;

    match delivery.send(&payload()).await.unwrap_err() {
        DeliveryError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("bad key"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_sendgrid_is_network_error() {
    let config = EmailConfig {
        enabled: true,
        base_url: "http://127.0.0.1:1".to_string(),
        ..EmailConfig::default()
    };
    let delivery = SendGridDelivery::from_config(&config).unwrap().with_api_key("SG.good");

    let err = delivery.send(&payload()).await.unwrap_err();
    assert!(matches!(err, DeliveryError::Network(_)));
}

#[tokio::test]
async fn test_payload_json_shape() {
    let value = serde_json::to_value(payload()).unwrap();
    assert_eq!(
        value,
        json!({
            "sender": "planner@example.com",
            "recipient": "traveller@example.com",
            "subject": "Trip to Lisbon",
            "html_body": "<html><body>Day 1</body></html>"
        })
    );
}
