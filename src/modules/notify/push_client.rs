use async_trait::async_trait;
use serde::Serialize;

use crate::core::config::NotifyConfig;
use crate::core::error::{AppError, Result};

use super::{Notifier, PushData};

/// Wire payload of the notification relay.
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    token: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a PushData,
}

/// HTTP client for the push-notification relay endpoint.
pub struct PushRelayClient {
    client: reqwest::Client,
    relay_url: String,
}

impl PushRelayClient {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: config.relay_url.clone(),
        }
    }
}

#[async_trait]
impl Notifier for PushRelayClient {
    async fn send(&self, token: &str, title: &str, body: &str, data: PushData) -> Result<()> {
        let message = RelayMessage {
            token,
            title,
            body,
            data: &data,
        };

        let response = self
            .client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Push relay request failed: {}", e);
                AppError::ExternalServiceError(format!("Push relay request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Push relay returned HTTP {}: {}", status, detail);
            return Err(AppError::ExternalServiceError(format!(
                "Push relay returned HTTP {}",
                status
            )));
        }

        tracing::debug!("Push dispatched for report {}", data.report_id);
        Ok(())
    }
}
