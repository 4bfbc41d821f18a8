// ── Full refresh and push bookkeeping ──

use chrono::Utc;

use super::InventoryStore;
use crate::model::Item;

impl InventoryStore {
    /// Replace the collection with a fresh listing and stamp the refresh time.
    pub(crate) fn apply_full_snapshot(&self, items: Vec<Item>) {
        let count = items.len();
        self.replace_all(items);
        self.last_full_refresh.send_replace(Some(Utc::now()));
        tracing::debug!(count, "applied full inventory snapshot");
    }

    pub(crate) fn mark_push_event(&self) {
        self.last_push_event.send_replace(Some(Utc::now()));
    }
}
