use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::config::StoreConfig;
use crate::core::error::{AppError, Result};

use super::{RealtimeStore, SnapshotStream, TransactionFn};

/// Compare-and-set retries before a transaction gives up.
const MAX_TRANSACTION_ATTEMPTS: usize = 16;

/// Client for the realtime datastore's REST dialect.
///
/// Every subtree is addressable as `{base}/{path}.json`. Reads return the
/// JSON value at the path (`null` when absent), `PATCH` merges fields,
/// `PUT` overwrites. Transactions use ETag-based compare-and-set, and
/// subscriptions ride the store's SSE change feed.
#[derive(Clone)]
pub struct RestStoreClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    reconnect_backoff: Duration,
}

impl RestStoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            reconnect_backoff: config.reconnect_backoff,
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        match &self.auth_token {
            Some(token) => format!(
                "{}/{}.json?auth={}",
                self.base_url,
                path,
                urlencoding::encode(token)
            ),
            None => format!("{}/{}.json", self.base_url, path),
        }
    }

    async fn checked(verb: &str, path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Store {} {} returned HTTP {}: {}", verb, path, status, body);
        Err(AppError::Store(format!(
            "{} {} returned HTTP {}",
            verb, path, status
        )))
    }
}

#[async_trait]
impl RealtimeStore for RestStoreClient {
    async fn get(&self, path: &str) -> Result<Value> {
        let response = self.client.get(self.url(path)).send().await.map_err(|e| {
            tracing::error!("Store GET {} failed: {}", path, e);
            AppError::Store(e.to_string())
        })?;
        let response = Self::checked("GET", path, response).await?;
        response.json().await.map_err(|e| {
            tracing::error!("Store GET {} returned invalid JSON: {}", path, e);
            AppError::Store(e.to_string())
        })
    }

    async fn update(&self, path: &str, fields: Value) -> Result<()> {
        let response = self
            .client
            .patch(self.url(path))
            .json(&fields)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Store PATCH {} failed: {}", path, e);
                AppError::Store(e.to_string())
            })?;
        Self::checked("PATCH", path, response).await?;
        Ok(())
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        let response = self
            .client
            .put(self.url(path))
            .json(&value)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Store PUT {} failed: {}", path, e);
                AppError::Store(e.to_string())
            })?;
        Self::checked("PUT", path, response).await?;
        Ok(())
    }

    async fn transaction(&self, path: &str, apply: TransactionFn) -> Result<Value> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let response = self
                .client
                .get(self.url(path))
                .header("X-Firebase-ETag", "true")
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("Store transactional read of {} failed: {}", path, e);
                    AppError::Store(e.to_string())
                })?;
            let response = Self::checked("GET", path, response).await?;
            let etag = response
                .headers()
                .get(header::ETAG)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::Store(format!("store returned no ETag for {}", path))
                })?;
            let current: Value = response.json().await.map_err(|e| {
                tracing::error!("Store GET {} returned invalid JSON: {}", path, e);
                AppError::Store(e.to_string())
            })?;

            let next = apply(current);

            let commit = self
                .client
                .put(self.url(path))
                .header(header::IF_MATCH, &etag)
                .json(&next)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("Store transactional write of {} failed: {}", path, e);
                    AppError::Store(e.to_string())
                })?;
            if commit.status() == StatusCode::PRECONDITION_FAILED {
                tracing::debug!(
                    "Transaction on {} lost compare-and-set race (attempt {}), retrying",
                    path,
                    attempt
                );
                continue;
            }
            Self::checked("PUT", path, commit).await?;
            return Ok(next);
        }
        Err(AppError::Store(format!(
            "transaction on {} did not converge after {} attempts",
            path, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    async fn subscribe(&self, path: &str) -> Result<SnapshotStream> {
        let initial = self.get(path).await?;

        let (tx, rx) = mpsc::channel::<()>(16);
        tokio::spawn(watch_changes(
            self.client.clone(),
            self.url(path),
            tx,
            self.reconnect_backoff,
        ));

        let state = SubscribeState {
            store: self.clone(),
            path: path.to_string(),
            rx,
            pending: Some(initial),
        };
        let stream = futures::stream::unfold(state, |mut state| async move {
            if let Some(snapshot) = state.pending.take() {
                return Some((snapshot, state));
            }
            loop {
                state.rx.recv().await?;
                // Coalesce bursts of change signals into one refresh.
                while state.rx.try_recv().is_ok() {}
                match state.store.get(&state.path).await {
                    Ok(snapshot) => return Some((snapshot, state)),
                    Err(e) => {
                        tracing::warn!(
                            "Snapshot refresh of {} failed, waiting for next change: {}",
                            state.path,
                            e
                        );
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}

struct SubscribeState {
    store: RestStoreClient,
    path: String,
    rx: mpsc::Receiver<()>,
    pending: Option<Value>,
}

/// Holds the SSE change feed open and signals on every remote write.
///
/// The feed is only used as a change notification; the subscriber re-reads
/// the full snapshot on each signal, so dropped or coalesced events cannot
/// leave it with stale data. Reconnects with a fixed backoff until the
/// subscriber goes away.
async fn watch_changes(
    client: reqwest::Client,
    url: String,
    tx: mpsc::Sender<()>,
    backoff: Duration,
) {
    loop {
        match client
            .get(&url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                let mut body = response.bytes_stream();
                let mut buffer = String::new();
                'read: while let Some(chunk) = body.next().await {
                    let bytes = match chunk {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            tracing::warn!("Store change feed read error: {}", e);
                            break 'read;
                        }
                    };
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    while let Some(end) = buffer.find("\n\n") {
                        let event = buffer[..end].to_string();
                        buffer.drain(..end + 2);
                        match event_name(&event) {
                            Some("put") | Some("patch") => {
                                if tx.send(()).await.is_err() {
                                    // Subscriber dropped its stream.
                                    return;
                                }
                            }
                            Some("auth_revoked") => {
                                tracing::warn!("Store change feed auth revoked, reconnecting");
                                break 'read;
                            }
                            // keep-alive and cancel events carry no data change
                            _ => {}
                        }
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(
                    "Store change feed connect returned HTTP {}",
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Store change feed connect failed: {}", e);
            }
        }
        if tx.is_closed() {
            return;
        }
        tokio::time::sleep(backoff).await;
    }
}

/// Extract the `event:` field from one raw SSE event block.
fn event_name(event: &str) -> Option<&str> {
    event
        .lines()
        .find_map(|line| line.strip_prefix("event:"))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_parses_sse_block() {
        let block = "event: put\ndata: {\"path\":\"/\",\"data\":null}";
        assert_eq!(event_name(block), Some("put"));
    }

    #[test]
    fn test_event_name_handles_keepalive() {
        let block = "event: keep-alive\ndata: null";
        assert_eq!(event_name(block), Some("keep-alive"));
    }

    #[test]
    fn test_event_name_missing_field() {
        assert_eq!(event_name("data: {}"), None);
    }

    #[test]
    fn test_url_appends_auth_token_when_present() {
        let client = RestStoreClient {
            client: reqwest::Client::new(),
            base_url: "https://db.example.com".to_string(),
            auth_token: Some("secret".to_string()),
            reconnect_backoff: Duration::from_secs(1),
        };
        assert_eq!(
            client.url("reports"),
            "https://db.example.com/reports.json?auth=secret"
        );
    }

    #[test]
    fn test_url_trims_path_slashes() {
        let client = RestStoreClient {
            client: reqwest::Client::new(),
            base_url: "https://db.example.com".to_string(),
            auth_token: None,
            reconnect_backoff: Duration::from_secs(1),
        };
        assert_eq!(
            client.url("/users/abc/warnCount/"),
            "https://db.example.com/users/abc/warnCount.json"
        );
    }
}
