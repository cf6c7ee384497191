//! Push-notification port.
//!
//! Status transitions notify the reporter through an external relay. The
//! dispatch is best-effort by contract: callers fire it after the status
//! write commits and never let a delivery failure roll that write back.

mod push_client;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::error::Result;

pub use push_client::PushRelayClient;

/// Structured payload attached to every push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    pub report_id: String,
    pub status: String,
    pub icon_type: String,
}

/// Delivery contract for reporter-facing push messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, token: &str, title: &str, body: &str, data: PushData) -> Result<()>;
}

/// Test double that records every dispatched message instead of sending it.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<SentPush>>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: PushData,
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, token: &str, title: &str, body: &str, data: PushData) -> Result<()> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentPush {
            token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
        });
        Ok(())
    }
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }
}
