// ── Reconciler ──
//
// Folds push notifications and local mutation results into the store under
// one policy: whatever is processed last wins. Every non-delete kind carries
// the full item, so applying it is a total replace and duplicates are
// harmless.

use std::sync::Arc;

use sweetsync_api::{ChannelState, NotificationStream};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::command::CommandResult;
use crate::model::Notification;
use crate::store::InventoryStore;

pub struct Reconciler {
    store: Arc<InventoryStore>,
    channel_state: Option<watch::Receiver<ChannelState>>,
}

impl Reconciler {
    pub fn new(store: Arc<InventoryStore>) -> Self {
        Self {
            store,
            channel_state: None,
        }
    }

    /// Track a push channel's connection state for [`is_live`](Self::is_live).
    pub fn with_channel_state(mut self, state: watch::Receiver<ChannelState>) -> Self {
        self.channel_state = Some(state);
        self
    }

    /// Apply one notification. Returns `true` if the store changed.
    ///
    /// A delete for an id the store never saw is a no-op.
    pub fn apply(&self, notification: Notification) -> bool {
        let kind = notification.kind();
        trace!(%kind, id = %notification.item_id(), "applying notification");

        match notification {
            Notification::Created(item)
            | Notification::Updated(item)
            | Notification::Purchased(item)
            | Notification::Restocked(item) => {
                self.store.upsert(item);
                true
            }
            Notification::Deleted { id } => self.store.remove(&id).is_some(),
        }
    }

    /// Apply the service's answer to a mutation this client issued.
    pub fn apply_local(&self, result: &CommandResult) {
        match result {
            CommandResult::Item(item) => {
                self.store.upsert(item.clone());
            }
            CommandResult::Deleted(id) => {
                self.store.remove(id);
            }
        }
    }

    /// True only while the tracked push channel is open.
    pub fn is_live(&self) -> bool {
        self.channel_state
            .as_ref()
            .is_some_and(|rx| rx.borrow().is_open())
    }

    /// Drain the push channel into the store until it ends or `cancel` fires.
    pub(crate) async fn run(self, mut notifications: NotificationStream, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                msg = notifications.recv() => match msg {
                    Some(msg) => {
                        self.apply(Notification::from(msg));
                        self.store.mark_push_event();
                    }
                    None => break,
                }
            }
        }
        debug!("reconciler exiting");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemId};

    fn fudge(quantity: u32) -> Item {
        Item {
            id: ItemId::Numeric(1),
            name: "Fudge".into(),
            category: "Candy".into(),
            price: 2.5,
            quantity,
        }
    }

    fn setup() -> (Arc<InventoryStore>, Reconciler) {
        let store = Arc::new(InventoryStore::new());
        let reconciler = Reconciler::new(Arc::clone(&store));
        (store, reconciler)
    }

    #[test]
    fn duplicate_notification_is_idempotent() {
        let (store, reconciler) = setup();
        reconciler.apply(Notification::Created(fudge(5)));
        let once = store.all();
        reconciler.apply(Notification::Created(fudge(5)));

        assert_eq!(store.len(), 1);
        assert_eq!(*store.all(), *once);
    }

    #[test]
    fn push_then_local_response_keeps_local() {
        let (store, reconciler) = setup();
        store.upsert(fudge(6));

        reconciler.apply(Notification::Purchased(fudge(5)));
        reconciler.apply_local(&CommandResult::Item(fudge(4)));

        assert_eq!(store.get(&ItemId::Numeric(1)).unwrap().quantity, 4);
    }

    #[test]
    fn local_response_then_push_keeps_push() {
        let (store, reconciler) = setup();
        store.upsert(fudge(6));

        reconciler.apply_local(&CommandResult::Item(fudge(4)));
        reconciler.apply(Notification::Purchased(fudge(5)));

        assert_eq!(store.get(&ItemId::Numeric(1)).unwrap().quantity, 5);
    }

    #[test]
    fn initial_fetch_then_purchase_publishes_one_snapshot() {
        let (store, reconciler) = setup();
        store.replace_all(vec![fudge(5)]);
        let stream = store.subscribe();
        let before = store.version();

        reconciler.apply(Notification::Purchased(fudge(4)));

        assert_eq!(store.version(), before + 1);
        assert_eq!(stream.current()[0].quantity, 5);
        assert_eq!(stream.latest()[0].quantity, 4);
    }

    #[test]
    fn delete_for_unknown_id_is_noop() {
        let (store, reconciler) = setup();
        store.upsert(fudge(5));
        let before = store.version();

        let changed = reconciler.apply(Notification::Deleted {
            id: ItemId::Numeric(404),
        });

        assert!(!changed);
        assert_eq!(store.version(), before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn local_delete_removes() {
        let (store, reconciler) = setup();
        store.upsert(fudge(5));
        reconciler.apply_local(&CommandResult::Deleted(ItemId::Numeric(1)));
        assert!(store.is_empty());
    }

    #[test]
    fn liveness_follows_channel_state() {
        let (store, _) = setup();
        let (tx, rx) = watch::channel(ChannelState::Connecting);
        let reconciler = Reconciler::new(store).with_channel_state(rx);

        assert!(!reconciler.is_live());
        tx.send_replace(ChannelState::Open);
        assert!(reconciler.is_live());
        tx.send_replace(ChannelState::Closed { retry_pending: true });
        assert!(!reconciler.is_live());
    }
}
