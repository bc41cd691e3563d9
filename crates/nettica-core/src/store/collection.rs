// ── Generic reactive record collection ──
//
// An ordered, id-unique sequence of records published through a `watch`
// channel. Every mutation swaps in a new snapshot, so subscribers always
// observe a consistent list and readers never block writers.

use std::sync::Arc;

use tokio::sync::watch;

use nettica_api::models::{Account, Device, Net, Vpn};

/// Records addressable by a string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed_by_id {
    ($($ty:ty),* $(,)?) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

keyed_by_id!(Device, Vpn, Net, Account);

/// A value owned by one account, such as its member list or its limits.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoped<V> {
    pub account_id: String,
    pub value: V,
}

impl<V> Keyed for Scoped<V> {
    fn key(&self) -> &str {
        &self.account_id
    }
}

/// Snapshot type shared with subscribers.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// Reactive collection holding at most one entry per key.
pub(crate) struct ResourceCollection<T: Keyed + Send + Sync + 'static> {
    items: watch::Sender<Snapshot<T>>,
}

impl<T: Keyed + Send + Sync + 'static> ResourceCollection<T> {
    pub(crate) fn new() -> Self {
        let (items, _) = watch::channel(Arc::new(Vec::new()));
        Self { items }
    }

    /// Replace the whole collection, keeping the first entry per key.
    pub(crate) fn replace_all(&self, items: Vec<T>) {
        let mut fresh: Vec<Arc<T>> = Vec::with_capacity(items.len());
        for item in items {
            if fresh.iter().any(|x| x.key() == item.key()) {
                tracing::warn!(key = item.key(), "duplicate key in server listing, skipped");
                continue;
            }
            fresh.push(Arc::new(item));
        }
        // `send_modify` updates unconditionally, even with zero receivers.
        self.items.send_modify(|snap| *snap = Arc::new(fresh));
    }

    /// Insert an entry, replacing one with the same key in place.
    /// Returns `true` if the key was new.
    pub(crate) fn upsert(&self, item: T) -> bool {
        let item = Arc::new(item);
        let mut is_new = false;
        self.items.send_modify(|snap| {
            let list = Arc::make_mut(snap);
            match list.iter().position(|x| x.key() == item.key()) {
                Some(index) => list[index] = item,
                None => {
                    list.push(item);
                    is_new = true;
                }
            }
        });
        is_new
    }

    /// Replace the entry with the same key in place. Returns `false`, and
    /// leaves the collection untouched, when no such entry exists.
    pub(crate) fn replace(&self, item: T) -> bool {
        let item = Arc::new(item);
        self.items.send_if_modified(|snap| {
            let Some(index) = snap.iter().position(|x| x.key() == item.key()) else {
                return false;
            };
            Arc::make_mut(snap)[index] = item;
            true
        })
    }

    /// Remove the entry with `key`, if present.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let mut removed = None;
        self.items.send_if_modified(|snap| {
            let Some(index) = snap.iter().position(|x| x.key() == key) else {
                return false;
            };
            removed = Some(Arc::make_mut(snap).remove(index));
            true
        });
        removed
    }

    /// Apply `f` to the list. Subscribers are notified only when `f`
    /// reports a change.
    pub(crate) fn modify(&self, f: impl FnOnce(&mut Vec<Arc<T>>) -> bool) -> bool {
        self.items.send_if_modified(|snap| {
            let mut list = (**snap).clone();
            if f(&mut list) {
                *snap = Arc::new(list);
                true
            } else {
                false
            }
        })
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.items
            .borrow()
            .iter()
            .find(|x| x.key() == key)
            .map(Arc::clone)
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.items.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.items.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn clear(&self) {
        self.items.send_modify(|snap| *snap = Arc::new(Vec::new()));
    }

    pub(crate) fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}
