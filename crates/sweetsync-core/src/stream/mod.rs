// ── Reactive item streams ──
//
// Subscription types for consuming collection changes from the store,
// either whole or through the session's active filter.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Item;

pub use filter::{ItemFilter, SearchFilter};

/// An immutable, id-ordered view of a collection.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// A subscription to a collection of entities.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct EntityStream<T: Clone + Send + Sync + 'static> {
    current: Snapshot<T>,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Snapshot<T> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> EntityWatchStream<T> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then a new one each time the
/// collection is mutated.
pub struct EntityWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<Snapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for EntityWatchStream<T> {
    type Item = Snapshot<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// ── Displayed projection ────────────────────────────────────────────

/// The store seen through the session's active filter.
///
/// Re-projects whenever either the collection or the filter changes, so
/// items matching an active search keep tracking live updates.
pub struct DisplayedStream {
    items: watch::Receiver<Snapshot<Item>>,
    filter: watch::Receiver<Arc<ItemFilter>>,
    current: Snapshot<Item>,
}

impl DisplayedStream {
    pub(crate) fn new(
        items: watch::Receiver<Snapshot<Item>>,
        filter: watch::Receiver<Arc<ItemFilter>>,
    ) -> Self {
        let current = project(&items.borrow(), &filter.borrow());
        Self {
            items,
            filter,
            current,
        }
    }

    pub fn current(&self) -> &Snapshot<Item> {
        &self.current
    }

    pub fn latest(&self) -> Snapshot<Item> {
        project(&self.items.borrow(), &self.filter.borrow())
    }

    /// Wait for the collection or the filter to change and return the new
    /// projection. `None` once the session is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<Item>> {
        let alive = tokio::select! {
            r = self.items.changed() => r.is_ok(),
            r = self.filter.changed() => r.is_ok(),
        };
        if !alive {
            return None;
        }

        let snap = project(
            &self.items.borrow_and_update(),
            &self.filter.borrow_and_update(),
        );
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` of projections.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot<Item>> + Send {
        futures_util::stream::unfold(self, |mut stream| async move {
            let snap = stream.changed().await?;
            Some((snap, stream))
        })
    }
}

fn project(items: &Snapshot<Item>, filter: &ItemFilter) -> Snapshot<Item> {
    if filter.is_all() {
        return Arc::clone(items);
    }
    Arc::new(
        items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect(),
    )
}
