#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use wayfarer::adapters::serpapi::{SearchBackend, SearchQuery};
use wayfarer::agents::error::{DeliveryError, ToolError};
use wayfarer::agents::llm::ScriptedProvider;
use wayfarer::agents::memory::InMemoryStore;
use wayfarer::agents::{EventBus, TravelAgent};
use wayfarer::config::Settings;
use wayfarer::domain::{DeliveryPayload, DeliveryPort, DeliveryReceipt};
use wayfarer::Collaborators;

/// Delivery double that records every payload
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<DeliveryPayload>>,
    fail: bool,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<DeliveryPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryPort for RecordingDelivery {
    async fn send(&self, payload: &DeliveryPayload) -> Result<DeliveryReceipt, DeliveryError> {
        self.sent.lock().unwrap().push(payload.clone());
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 550,
                message: "mailbox unavailable".to_string(),
            });
        }
        Ok(DeliveryReceipt {
            status: Some(202),
            message_id: Some("msg-1".to_string()),
        })
    }
}

/// Search backend answering every query with the same document
pub struct CannedSearch {
    response: Value,
    queries: Mutex<Vec<SearchQuery>>,
}

impl CannedSearch {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn hotels() -> Self {
        Self::new(json!({
            "properties": [
                { "name": "Hotel Avenida", "overall_rating": 4.6 },
                { "name": "Casa do Largo", "overall_rating": 4.4 }
            ]
        }))
    }

    pub fn flights() -> Self {
        Self::new(json!({
            "best_flights": [{ "airline": "Air France", "price": 612 }],
            "other_flights": [{ "airline": "Delta", "price": 655 }]
        }))
    }

    pub fn queries(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_param(&self, key: &str) -> Option<String> {
        let queries = self.queries.lock().unwrap();
        queries
            .last()
            .and_then(|q| q.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone()))
    }
}

#[async_trait]
impl SearchBackend for CannedSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Value, ToolError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.response.clone())
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.email.from = "planner@example.com".to_string();
    settings.email.to = "traveller@example.com".to_string();
    settings.email.subject = "Trip to Lisbon".to_string();
    settings
}

pub struct Harness {
    pub agent: TravelAgent,
    pub provider: Arc<ScriptedProvider>,
    pub delivery: Arc<RecordingDelivery>,
    pub search: Arc<CannedSearch>,
    pub events: EventBus,
}

pub fn harness(provider: ScriptedProvider) -> Harness {
    harness_with(provider, RecordingDelivery::new(), test_settings())
}

pub fn harness_with(
    provider: ScriptedProvider,
    delivery: RecordingDelivery,
    settings: Settings,
) -> Harness {
    build(provider, delivery, CannedSearch::hotels(), settings)
}

pub fn harness_with_search(provider: ScriptedProvider, search: CannedSearch) -> Harness {
    build(provider, RecordingDelivery::new(), search, test_settings())
}

fn build(
    provider: ScriptedProvider,
    delivery: RecordingDelivery,
    search: CannedSearch,
    settings: Settings,
) -> Harness {
    let provider = Arc::new(provider);
    let delivery = Arc::new(delivery);
    let search = Arc::new(search);
    let events = EventBus::new(256);

    let agent = wayfarer::assemble(
        &settings,
        Collaborators {
            provider: provider.clone(),
            search: search.clone(),
            delivery: delivery.clone(),
            store: Arc::new(InMemoryStore::new()),
        },
        events.clone(),
    )
    .unwrap();

    Harness {
        agent,
        provider,
        delivery,
        search,
        events,
    }
}

/// Serve `router` on an ephemeral port; returns its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}
