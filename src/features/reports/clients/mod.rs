mod publicize_client;

use async_trait::async_trait;

use crate::core::error::Result;

pub use publicize_client::PublicizeClient;

/// Broadcast contract for pushing a report's details beyond the
/// reporting user.
#[async_trait]
pub trait Publicizer: Send + Sync {
    async fn publicize(&self, report_id: &str) -> Result<()>;
}
