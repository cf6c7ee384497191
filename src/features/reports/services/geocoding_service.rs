use std::collections::HashMap;

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::core::config::GeocodeConfig;
use crate::core::error::{AppError, Result};

/// Nominatim reverse lookup response structure
#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Service resolving report coordinates to place names using Nominatim
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
    cache: RwLock<HashMap<String, String>>,
}

impl GeocodingService {
    pub fn new(config: &GeocodeConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.clone(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Human-readable place name for a coordinate pair.
    ///
    /// Returns the plain `"lat, lng"` string when the provider has no
    /// answer or the request fails. Successful lookups are memoized so a
    /// table full of reports at the same spot costs one request.
    pub async fn reverse(&self, lat: f64, lng: f64) -> String {
        let key = format!("{},{}", lat, lng);
        if let Some(hit) = self.cache.read().await.get(&key) {
            return hit.clone();
        }

        match self.execute_request(lat, lng).await {
            Ok(Some(name)) => {
                self.cache.write().await.insert(key, name.clone());
                name
            }
            Ok(None) => format!("{}, {}", lat, lng),
            Err(e) => {
                tracing::warn!("Reverse geocoding failed for {}: {}", key, e);
                format!("{}, {}", lat, lng)
            }
        }
    }

    /// Seeds the memo cache without touching the network.
    #[cfg(test)]
    pub(crate) async fn prime(&self, lat: f64, lng: f64, name: &str) {
        self.cache
            .write()
            .await
            .insert(format!("{},{}", lat, lng), name.to_string());
    }

    /// Execute HTTP request to Nominatim and parse response
    async fn execute_request(&self, lat: f64, lng: f64) -> Result<Option<String>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.base_url, lat, lng
        );

        tracing::debug!("Reverse geocoding: {},{} -> {}", lat, lng, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!("Nominatim request failed: {:?}", e);
            AppError::ExternalServiceError(format!("Nominatim request failed: {}", e))
        })?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return Ok(None);
        }

        let result: ReverseGeocodeResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Nominatim response: {:?}", e);
            AppError::ExternalServiceError(format!("Failed to parse Nominatim response: {}", e))
        })?;

        Ok(result.display_name)
    }
}
