use std::sync::Arc;

use tokio::sync::watch;

/// Shared snapshot of one store collection, replaced wholesale by the feed
/// worker and read lock-free by request handlers.
///
/// Readers always see a complete table, never a partially applied update.
/// Observers that fall behind skip straight to the latest table; there is
/// no per-change backlog to drain.
pub struct LiveTable<T> {
    tx: watch::Sender<Arc<T>>,
}

impl<T> LiveTable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Latest published table.
    pub fn load(&self) -> Arc<T> {
        self.tx.borrow().clone()
    }

    /// Publish a new table, waking every observer.
    pub fn replace(&self, next: T) {
        self.tx.send_replace(Arc::new(next));
    }

    /// Observe replacements. The current table counts as seen; the first
    /// wakeup is the next `replace`.
    pub fn watch(&self) -> watch::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

impl<T: Default> Default for LiveTable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
