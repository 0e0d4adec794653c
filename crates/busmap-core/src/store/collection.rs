// ── Generic reactive entity collection ──
//
// Concurrent storage with O(1) lookups and push-based change notification
// via `watch` channels. Snapshots are kept sorted so every consumer sees
// the same order.

use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// Sort order applied to every snapshot.
pub(crate) type SnapshotOrder<T> = fn(&T, &T) -> Ordering;

/// A reactive collection for a single entity type.
///
/// Uses `DashMap` for concurrent lookups and `watch` channels for
/// push-based change notification. Every visible mutation bumps a version
/// counter and rebuilds the snapshot that subscribers receive.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    /// Primary storage: key string -> entity. Keys are the entity's
    /// numeric InfoPoint id rendered as a string.
    by_key: DashMap<String, Arc<T>>,

    order: SnapshotOrder<T>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full sorted snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new(order: SnapshotOrder<T>) -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            order,
            version,
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, entity: T) -> bool {
        let is_new = self.upsert_silent(key, entity);
        self.flush();
        is_new
    }

    /// Insert or update without notifying subscribers. Pair with
    /// [`flush`](Self::flush) to publish a batch as one change.
    pub(crate) fn upsert_silent(&self, key: String, entity: T) -> bool {
        self.by_key.insert(key, Arc::new(entity)).is_none()
    }

    /// Remove an entity by key without notifying subscribers.
    pub(crate) fn remove_silent(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.remove(key).map(|(_, v)| v)
    }

    /// Look up an entity by its primary key string.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Remove all entities.
    pub(crate) fn clear(&self) {
        self.by_key.clear();
        self.flush();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Return all current primary keys in the collection.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.by_key.iter().map(|r| r.key().clone()).collect()
    }

    #[allow(dead_code)]
    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Rebuild the sorted snapshot and broadcast it to subscribers.
    pub(crate) fn flush(&self) {
        let mut values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        let order = self.order;
        values.sort_by(|a, b| order(a, b));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}
