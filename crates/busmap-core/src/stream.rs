// ── Snapshot subscriptions ──
//
// Each store collection publishes one sorted snapshot per change: a route
// refresh, a vehicle poll, or a loaded trace. Consumers never see partial
// updates, only whole snapshots.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared, sorted snapshot of one collection.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// `Stream` of snapshots: the one current at conversion, then one per change.
pub type SnapshotStream<T> = WatchStream<Snapshot<T>>;

/// A subscription to one store collection (routes, vehicles, stops,
/// alerts, or traces).
pub struct EntityStream<T: Send + Sync + 'static> {
    seen: Snapshot<T>,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<Snapshot<T>>) -> Self {
        let seen = receiver.borrow_and_update().clone();
        Self { seen, receiver }
    }

    /// The snapshot taken at subscription or by the last `changed()` /
    /// `wait_for()`.
    pub fn current(&self) -> &Snapshot<T> {
        &self.seen
    }

    /// Whatever the store holds right now, without marking it seen.
    pub fn latest(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Next published snapshot. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        self.seen = self.receiver.borrow_and_update().clone();
        Some(self.seen.clone())
    }

    /// First snapshot, the latest included, for which `ready` holds.
    ///
    /// Handy for "wait until the first trace arrives" without racing the
    /// background loaders.
    pub async fn wait_for(
        &mut self,
        mut ready: impl FnMut(&[Arc<T>]) -> bool,
    ) -> Option<Snapshot<T>> {
        let snap = self
            .receiver
            .wait_for(|snap| ready(snap.as_slice()))
            .await
            .ok()?
            .clone();
        self.seen = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> SnapshotStream<T> {
        WatchStream::new(self.receiver)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use super::*;
    use crate::store::collection::EntityCollection;

    fn labels(snap: &Snapshot<String>) -> Vec<&str> {
        snap.iter().map(|s| s.as_str()).collect()
    }

    #[tokio::test]
    async fn stream_yields_current_then_changes() {
        let col: EntityCollection<String> = EntityCollection::new(|a, b| a.cmp(b));
        col.upsert("1".into(), "B43".into());

        let mut stream = EntityStream::new(col.subscribe()).into_stream();
        assert_eq!(labels(&stream.next().await.unwrap()), ["B43"]);

        col.upsert("2".into(), "R29".into());
        assert_eq!(labels(&stream.next().await.unwrap()), ["B43", "R29"]);
    }

    #[tokio::test]
    async fn changed_updates_current() {
        let col: EntityCollection<String> = EntityCollection::new(|a, b| a.cmp(b));
        let mut stream = EntityStream::new(col.subscribe());
        assert!(stream.current().is_empty());

        col.upsert("1".into(), "B43".into());
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(stream.current().len(), 1);
    }

    #[tokio::test]
    async fn wait_for_sees_already_published_snapshot() {
        let col: EntityCollection<String> = EntityCollection::new(|a, b| a.cmp(b));
        let mut stream = EntityStream::new(col.subscribe());
        col.upsert("1".into(), "B43".into());
        col.upsert("2".into(), "R29".into());

        let snap = stream.wait_for(|s| s.len() == 2).await.unwrap();
        assert_eq!(labels(&snap), ["B43", "R29"]);
        assert_eq!(stream.current().len(), 2);
    }

    #[tokio::test]
    async fn wait_for_waits_for_a_later_change() {
        let col = Arc::new(EntityCollection::<String>::new(|a, b| a.cmp(b)));
        let mut stream = EntityStream::new(col.subscribe());

        let writer = Arc::clone(&col);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            writer.upsert("7".into(), "G73".into());
        });

        let snap = stream.wait_for(|s| !s.is_empty()).await.unwrap();
        assert_eq!(labels(&snap), ["G73"]);
    }
}
