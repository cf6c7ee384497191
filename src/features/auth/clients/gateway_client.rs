use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};

use super::{AuthGateway, AuthRecord, VerifiedIdentity};

/// Account record as returned by the auth provider's REST API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayAccount {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<GatewayAccount>,
}

/// HTTP client for the external auth provider.
///
/// Speaks the provider's account REST dialect: `accounts:lookup` resolves
/// tokens and uids to account records, `accounts:update` toggles sign-in.
pub struct AuthGatewayClient {
    client: reqwest::Client,
    base_url: String,
    server_key: Option<String>,
}

impl AuthGatewayClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            server_key: config.server_key.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        match &self.server_key {
            Some(key) => format!(
                "{}/v1/accounts:{}?key={}",
                self.base_url,
                action,
                urlencoding::encode(key)
            ),
            None => format!("{}/v1/accounts:{}", self.base_url, action),
        }
    }

    async fn lookup(&self, body: serde_json::Value) -> Result<Vec<GatewayAccount>> {
        let response = self
            .client
            .post(self.endpoint("lookup"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Auth gateway lookup failed: {}", e);
                AppError::ExternalServiceError(format!("Auth gateway lookup failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Auth gateway lookup returned HTTP {}", status);
            return Err(AppError::Unauthorized(
                "Auth provider rejected the lookup".to_string(),
            ));
        }

        let lookup: LookupResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse auth gateway response: {}", e);
            AppError::ExternalServiceError(format!("Failed to parse auth gateway response: {}", e))
        })?;

        Ok(lookup.users)
    }
}

#[async_trait]
impl AuthGateway for AuthGatewayClient {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity> {
        let accounts = self.lookup(json!({ "idToken": token })).await?;
        let account = accounts.into_iter().next().ok_or_else(|| {
            AppError::Unauthorized("Token does not match a known account".to_string())
        })?;

        Ok(VerifiedIdentity {
            uid: account.local_id,
            email: account.email,
        })
    }

    async fn get_auth_record(&self, uid: &str) -> Result<AuthRecord> {
        let accounts = self.lookup(json!({ "localId": [uid] })).await?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("No auth account for uid {}", uid)))?;

        Ok(AuthRecord {
            uid: account.local_id,
            email: account.email,
            email_verified: account.email_verified,
            disabled: account.disabled,
        })
    }

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<()> {
        let body = json!({ "localId": uid, "disableUser": disabled });
        let response = self
            .client
            .post(self.endpoint("update"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Auth gateway update for {} failed: {}", uid, e);
                AppError::ExternalServiceError(format!("Auth gateway update failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("Auth gateway update for {} returned HTTP {}: {}", uid, status, detail);
            return Err(AppError::ExternalServiceError(format!(
                "Auth gateway update returned HTTP {}",
                status
            )));
        }

        Ok(())
    }
}
