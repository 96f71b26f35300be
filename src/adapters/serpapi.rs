//! SerpAPI search transport

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::agents::error::ToolError;
use crate::config::SearchConfig;

/// Query parameters of one search
pub type SearchQuery = Vec<(&'static str, String)>;

/// Search engine transport used by the lookup tools
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Value, ToolError>;
}

/// Locale applied to every search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLocale {
    pub language: String,
    pub country: String,
    pub currency: String,
}

impl From<&SearchConfig> for SearchLocale {
    fn from(config: &SearchConfig) -> Self {
        Self {
            language: config.language.clone(),
            country: config.country.clone(),
            currency: config.currency.clone(),
        }
    }
}

impl Default for SearchLocale {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            country: "us".to_string(),
            currency: "USD".to_string(),
        }
    }
}

/// `GET {base_url}/search.json` client
pub struct SerpApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl SerpApiClient {
    /// Build from configuration. A missing key is reported per search, not here.
    pub fn from_config(config: &SearchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty()),
            api_key_env: config.api_key_env.clone(),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl SearchBackend for SerpApiClient {
    #[instrument(skip(self, query), fields(engine = tracing::field::Empty))]
    async fn search(&self, query: &SearchQuery) -> Result<Value, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::Upstream(format!("{} is not set", self.api_key_env)))?;

        if let Some((_, engine)) = query.iter().find(|(k, _)| *k == "engine") {
            tracing::Span::current().record("engine", engine.as_str());
        }

        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(query)
            .query(&[("api_key", api_key)])
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("Search request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("Malformed search response: {}", e)))?;

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(ToolError::Upstream(error.to_string()));
        }
        if !status.is_success() {
            return Err(ToolError::Upstream(format!(
                "Search failed with status {}",
                status.as_u16()
            )));
        }

        debug!("Search succeeded");
        Ok(body)
    }
}

/// First `max` elements of the array at `key`, or an empty list
pub(crate) fn take_results(body: &Value, key: &str, max: usize) -> Vec<Value> {
    body.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().take(max).cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Backend returning a canned body and recording every query
    pub struct RecordingBackend {
        pub response: Result<Value, ToolError>,
        pub queries: Mutex<Vec<SearchQuery>>,
    }

    impl RecordingBackend {
        pub fn returning(response: Value) -> Self {
            Self {
                response: Ok(response),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                response: Err(ToolError::Upstream(message.to_string())),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
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
    impl SearchBackend for RecordingBackend {
        async fn search(&self, query: &SearchQuery) -> Result<Value, ToolError> {
            self.queries.lock().unwrap().push(query.clone());
            self.response.clone()
        }
    }
}
