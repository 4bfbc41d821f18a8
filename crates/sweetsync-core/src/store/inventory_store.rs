// ── Inventory entity store ──
//
// Thread-safe mapping of item id to latest item snapshot. Mutations are
// broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{Item, ItemId};
use crate::stream::{EntityStream, Snapshot};

/// Reactive store for inventory items.
///
/// Reads never block writers for long: lookups hit a `DashMap` shard,
/// snapshot reads clone an `Arc`. Store operations have no error
/// conditions.
pub struct InventoryStore {
    pub(crate) items: EntityCollection<Item>,
    pub(crate) last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) last_push_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl InventoryStore {
    pub fn new() -> Self {
        let (last_full_refresh, _) = watch::channel(None);
        let (last_push_event, _) = watch::channel(None);

        Self {
            items: EntityCollection::new(),
            last_full_refresh,
            last_push_event,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Every item, ordered by id. The returned snapshot never changes.
    pub fn all(&self) -> Snapshot<Item> {
        self.items.snapshot()
    }

    pub fn get(&self, id: &ItemId) -> Option<Arc<Item>> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count of effective mutations since creation.
    pub fn version(&self) -> u64 {
        self.items.version()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert or wholesale replace by id. Returns `true` if the id was new.
    pub fn upsert(&self, item: Item) -> bool {
        self.items.upsert(item.id.clone(), item)
    }

    /// Remove by id. Absent ids are a no-op.
    pub fn remove(&self, id: &ItemId) -> Option<Arc<Item>> {
        self.items.remove(id)
    }

    /// Swap the whole collection in one snapshot.
    pub fn replace_all(&self, items: Vec<Item>) {
        self.items
            .replace_all(items.into_iter().map(|item| (item.id.clone(), item)));
    }

    pub fn clear(&self) {
        self.items.clear();
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> EntityStream<Item> {
        EntityStream::new(self.items.subscribe())
    }

    pub(crate) fn subscribe_raw(&self) -> watch::Receiver<Snapshot<Item>> {
        self.items.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        *self.last_push_event.borrow()
    }

    /// Time since the last full refresh.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new()
    }
}
