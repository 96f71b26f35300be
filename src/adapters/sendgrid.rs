//! Email delivery

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument};

use crate::agents::error::DeliveryError;
use crate::config::EmailConfig;
use crate::domain::{DeliveryPayload, DeliveryPort, DeliveryReceipt};

/// SendGrid v3 mail API client
pub struct SendGridDelivery {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl SendGridDelivery {
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
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
impl DeliveryPort for SendGridDelivery {
    #[instrument(skip(self, payload), fields(recipient = %payload.recipient))]
    async fn send(&self, payload: &DeliveryPayload) -> Result<DeliveryReceipt, DeliveryError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured(format!("{} is not set", self.api_key_env)))?;

        let body = json!({
            "personalizations": [{ "to": [{ "email": payload.recipient }] }],
            "from": { "email": payload.sender },
            "subject": payload.subject,
            "content": [{ "type": "text/html", "value": payload.html_body }]
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!(status = status.as_u16(), "Email sent");
        Ok(DeliveryReceipt {
            status: Some(status.as_u16()),
            message_id,
        })
    }
}

/// Delivery used when email is disabled: logs the payload, sends nothing
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl DeliveryPort for LogDelivery {
    async fn send(&self, payload: &DeliveryPayload) -> Result<DeliveryReceipt, DeliveryError> {
        info!(
            recipient = %payload.recipient,
            subject = %payload.subject,
            bytes = payload.html_body.len(),
            "Email delivery disabled; payload logged only"
        );
        Ok(DeliveryReceipt {
            status: None,
            message_id: None,
        })
    }
}
