//! Realtime datastore port.
//!
//! The dashboard never owns report or user data; it mirrors a remote
//! realtime database that pushes full-collection snapshots. This module
//! defines the store contract, the REST-dialect client used in production,
//! an in-memory implementation for tests and local development, and the
//! reactive cache container that fans snapshot revisions out to observers.

mod cache;
mod memory;
mod rest_client;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::core::error::Result;

pub use cache::LiveTable;
pub use memory::MemoryStore;
pub use rest_client::RestStoreClient;

/// Stream of full snapshots of one subtree. The first item is the current
/// snapshot; later items follow remote changes. Intermediate states may be
/// coalesced - consumers only ever see the most recent snapshot.
pub type SnapshotStream = BoxStream<'static, Value>;

/// Closure applied inside [`RealtimeStore::transaction`]. May be invoked
/// more than once when the commit loses a compare-and-set race.
pub type TransactionFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Contract of the remote realtime datastore.
///
/// Paths are slash-separated (`reports`, `users/{uid}/warnCount`). Absent
/// paths read as `Value::Null`.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// One-shot snapshot of the subtree at `path`.
    async fn get(&self, path: &str) -> Result<Value>;

    /// Partial field merge at `path` (last-write-wins per field).
    async fn update(&self, path: &str, fields: Value) -> Result<()>;

    /// Whole-value overwrite at `path`.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Atomic read-modify-write of the value at `path`. Returns the
    /// committed value. Concurrent transactions on the same path must not
    /// lose updates.
    async fn transaction(&self, path: &str, apply: TransactionFn) -> Result<Value>;

    /// Subscribe to the subtree at `path`; see [`SnapshotStream`].
    async fn subscribe(&self, path: &str) -> Result<SnapshotStream>;
}
