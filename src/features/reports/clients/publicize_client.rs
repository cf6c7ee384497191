use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::PublicizeConfig;
use crate::core::error::{AppError, Result};
use crate::features::reports::clients::Publicizer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicizeRequest<'a> {
    report_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PublicizeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the external broadcast endpoint.
pub struct PublicizeClient {
    client: reqwest::Client,
    url: String,
}

impl PublicizeClient {
    pub fn new(config: &PublicizeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl Publicizer for PublicizeClient {
    async fn publicize(&self, report_id: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&PublicizeRequest { report_id })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Publicize request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Publicize request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Publicize endpoint returned {}: {}", status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Publicize endpoint returned {}",
                status
            )));
        }

        let outcome: PublicizeResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse publicize response: {:?}", e);
            AppError::ExternalServiceError(format!(
                "Failed to parse publicize response: {}",
                e
            ))
        })?;

        if !outcome.success {
            let detail = outcome
                .error
                .unwrap_or_else(|| "no error detail".to_string());
            tracing::warn!("Publicize endpoint rejected report {}: {}", report_id, detail);
            return Err(AppError::ExternalServiceError(format!(
                "Publicize failed: {}",
                detail
            )));
        }

        tracing::info!("Report {} publicized", report_id);
        Ok(())
    }
}
