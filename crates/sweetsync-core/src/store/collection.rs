// ── Generic reactive entity collection ──
//
// Concurrent storage with O(1) lookups and push-based change notification
// via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::ItemId;
use crate::stream::Snapshot;

/// A reactive collection keyed by `ItemId`.
///
/// Every effective mutation rebuilds the id-ordered snapshot that
/// subscribers receive and bumps the version counter once. Mutation and
/// rebuild both run under the snapshot sender's lock, so published
/// snapshots are totally ordered with the mutations that produced them.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_id: DashMap<ItemId, Arc<T>>,

    /// Version counter, bumped on every effective mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or wholesale replace an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: ItemId, entity: T) -> bool {
        let mut is_new = false;
        self.snapshot.send_modify(|snap| {
            is_new = self.by_id.insert(id, Arc::new(entity)).is_none();
            *snap = self.collect_sorted();
        });
        self.bump_version();
        is_new
    }

    /// Remove an entity. Absent ids are a no-op: no snapshot, no version bump.
    pub(crate) fn remove(&self, id: &ItemId) -> Option<Arc<T>> {
        let mut removed = None;
        self.snapshot.send_if_modified(|snap| {
            removed = self.by_id.remove(id).map(|(_, v)| v);
            if removed.is_some() {
                *snap = self.collect_sorted();
            }
            removed.is_some()
        });
        if removed.is_some() {
            self.bump_version();
        }
        removed
    }

    /// Swap the whole contents, publishing exactly one snapshot.
    pub(crate) fn replace_all(&self, entities: impl IntoIterator<Item = (ItemId, T)>) {
        self.snapshot.send_modify(|snap| {
            self.by_id.clear();
            for (id, entity) in entities {
                self.by_id.insert(id, Arc::new(entity));
            }
            *snap = self.collect_sorted();
        });
        self.bump_version();
    }

    /// Remove all entities.
    pub(crate) fn clear(&self) {
        self.snapshot.send_modify(|snap| {
            self.by_id.clear();
            *snap = Arc::new(Vec::new());
        });
        self.bump_version();
    }

    pub(crate) fn get(&self, id: &ItemId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains(&self, id: &ItemId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn collect_sorted(&self) -> Snapshot<T> {
        let mut entries: Vec<(ItemId, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Arc::new(entries.into_iter().map(|(_, v)| v).collect())
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(n: i64) -> ItemId {
        ItemId::Numeric(n)
    }

    #[test]
    fn upsert_reports_new_ids() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.upsert(id(1), "hello".into()));
        assert!(!col.upsert(id(1), "world".into()));
        assert_eq!(*col.get(&id(1)).unwrap(), "world");
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(id(1), "a".into());
        let before = col.version();
        let rx = col.subscribe();

        assert!(col.remove(&id(99)).is_none());
        assert_eq!(col.version(), before);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(id(3), "c".into());
        col.upsert(id(1), "a".into());
        col.upsert(ItemId::Opaque("z".into()), "z".into());
        col.upsert(id(2), "b".into());

        let snap: Vec<String> = col.snapshot().iter().map(|s| (**s).clone()).collect();
        assert_eq!(snap, vec!["a", "b", "c", "z"]);
    }

    #[test]
    fn each_effective_mutation_bumps_version_once() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(id(1), "a".into());
        col.upsert(id(1), "b".into());
        col.remove(&id(1));
        assert_eq!(col.version(), 3);
    }

    #[test]
    fn replace_all_publishes_one_snapshot() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(id(9), "stale".into());
        let before = col.version();

        col.replace_all(vec![(id(1), "a".into()), (id(2), "b".into())]);

        assert_eq!(col.version(), before + 1);
        assert!(!col.contains(&id(9)));
        assert_eq!(col.snapshot().len(), 2);
    }

    #[test]
    fn clear_empties_everything() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(id(1), "x".into());
        col.upsert(id(2), "y".into());
        assert_eq!(col.len(), 2);

        col.clear();
        assert!(col.is_empty());
        assert!(col.snapshot().is_empty());
    }
}
