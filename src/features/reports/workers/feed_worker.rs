use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::time::sleep;

use crate::features::reports::models::ReportTable;
use crate::features::users::models::UserTable;
use crate::modules::store::{LiveTable, RealtimeStore};

/// Mirrors the store's report and user collections into the in-memory
/// tables every request path reads from.
///
/// Each snapshot fully replaces the previous table, so readers never see
/// a partially patched state. If a feed drops, the worker resubscribes
/// after a backoff and the next snapshot catches everything up.
pub struct FeedWorker {
    store: Arc<dyn RealtimeStore>,
    reports: Arc<LiveTable<ReportTable>>,
    users: Arc<LiveTable<UserTable>>,
    reconnect_backoff: Duration,
}

impl FeedWorker {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        reports: Arc<LiveTable<ReportTable>>,
        users: Arc<LiveTable<UserTable>>,
        reconnect_backoff: Duration,
    ) -> Self {
        Self {
            store,
            reports,
            users,
            reconnect_backoff,
        }
    }

    /// Runs both collection feeds until the process shuts down.
    pub async fn run(&self) {
        tracing::info!("Live table feed started");
        tokio::join!(
            self.feed("reports", &self.reports, ReportTable::from_snapshot),
            self.feed("users", &self.users, UserTable::from_snapshot),
        );
    }

    async fn feed<T>(&self, path: &'static str, table: &LiveTable<T>, build: fn(&Value) -> T) {
        loop {
            match self.store.subscribe(path).await {
                Ok(mut stream) => {
                    while let Some(snapshot) = stream.next().await {
                        table.replace(build(&snapshot));
                        tracing::debug!("Replaced {} cache from snapshot", path);
                    }
                    tracing::warn!("Feed for {} ended, resubscribing", path);
                }
                Err(e) => {
                    tracing::error!("Failed to subscribe to {}: {}", path, e);
                }
            }
            sleep(self.reconnect_backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use serde_json::json;
    use tokio::time::timeout;

    use crate::core::error::Result;
    use crate::modules::store::{MemoryStore, SnapshotStream, TransactionFn};

    const WAIT: Duration = Duration::from_secs(5);

    /// Store whose report feed delivers one snapshot and then ends; the
    /// feed handed out on resubscription stays open.
    struct DroppingFeedStore {
        report_subscriptions: std::sync::Mutex<u32>,
    }

    impl DroppingFeedStore {
        fn new() -> Self {
            Self {
                report_subscriptions: std::sync::Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl RealtimeStore for DroppingFeedStore {
        async fn get(&self, _path: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn update(&self, _path: &str, _fields: Value) -> Result<()> {
            Ok(())
        }

        async fn set(&self, _path: &str, _value: Value) -> Result<()> {
            Ok(())
        }

        async fn transaction(&self, _path: &str, _apply: TransactionFn) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn subscribe(&self, path: &str) -> Result<SnapshotStream> {
            if path != "reports" {
                return Ok(stream::pending().boxed());
            }
            let mut subs = self.report_subscriptions.lock().unwrap();
            *subs += 1;
            if *subs == 1 {
                Ok(stream::iter(vec![json!({"-r1": {"timestamp": 1}})]).boxed())
            } else {
                Ok(stream::iter(vec![json!({
                    "-r1": {"timestamp": 1},
                    "-r2": {"timestamp": 2},
                })])
                .chain(stream::pending())
                .boxed())
            }
        }
    }

    #[tokio::test]
    async fn test_snapshots_replace_both_tables() {
        let store = MemoryStore::with_tree(json!({
            "reports": {"r1": {"timestamp": 1}},
            "users": {"u1": {"name": "A"}},
        }));
        let reports = Arc::new(LiveTable::<ReportTable>::default());
        let users = Arc::new(LiveTable::<UserTable>::default());

        let mut reports_rx = reports.watch();
        let mut users_rx = users.watch();

        let worker = Arc::new(FeedWorker::new(
            Arc::new(store.clone()),
            reports.clone(),
            users.clone(),
            Duration::from_millis(10),
        ));
        tokio::spawn({
            let worker = worker.clone();
            async move { worker.run().await }
        });

        timeout(WAIT, reports_rx.changed()).await.unwrap().unwrap();
        assert_eq!(reports.load().len(), 1);
        timeout(WAIT, users_rx.changed()).await.unwrap().unwrap();
        assert_eq!(users.load().len(), 1);

        store
            .set("reports/r2", json!({"timestamp": 2}))
            .await
            .unwrap();
        timeout(WAIT, reports_rx.changed()).await.unwrap().unwrap();
        assert_eq!(reports.load().len(), 2);
        assert!(reports.load().get("r2").is_some());
    }

    #[tokio::test]
    async fn test_deleted_collection_yields_empty_table() {
        let store = MemoryStore::with_tree(json!({
            "reports": {"r1": {"timestamp": 1}},
        }));
        let reports = Arc::new(LiveTable::<ReportTable>::default());
        let users = Arc::new(LiveTable::<UserTable>::default());

        let mut reports_rx = reports.watch();

        let worker = Arc::new(FeedWorker::new(
            Arc::new(store.clone()),
            reports.clone(),
            users,
            Duration::from_millis(10),
        ));
        tokio::spawn({
            let worker = worker.clone();
            async move { worker.run().await }
        });

        timeout(WAIT, reports_rx.changed()).await.unwrap().unwrap();
        assert_eq!(reports.load().len(), 1);

        store.set("reports", Value::Null).await.unwrap();
        timeout(WAIT, reports_rx.changed()).await.unwrap().unwrap();
        assert!(reports.load().is_empty());
    }

    #[tokio::test]
    async fn test_resubscribes_when_feed_ends() {
        let store = Arc::new(DroppingFeedStore::new());
        let reports = Arc::new(LiveTable::<ReportTable>::default());
        let users = Arc::new(LiveTable::<UserTable>::default());

        let mut reports_rx = reports.watch();

        let worker = Arc::new(FeedWorker::new(
            store.clone(),
            reports.clone(),
            users,
            Duration::from_millis(10),
        ));
        tokio::spawn({
            let worker = worker.clone();
            async move { worker.run().await }
        });

        // The first feed ends after one snapshot; the replacement feed
        // carries the catch-up snapshot.
        timeout(WAIT, async {
            loop {
                reports_rx.changed().await.unwrap();
                if reports.load().len() == 2 {
                    break;
                }
            }
        })
        .await
        .unwrap();

        assert!(reports.load().get("-r2").is_some());
        assert_eq!(*store.report_subscriptions.lock().unwrap(), 2);
    }
}
