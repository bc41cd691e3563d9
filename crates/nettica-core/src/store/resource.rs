// ── Generic resource store ──
//
// Optimistic client-side cache for one server collection: full reads
// replace the list wholesale, mutations patch it with the server's echo.
// The server stays the source of truth; the next `read_all` corrects any
// drift.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use nettica_api::models::{Device, Net, Resource, Vpn};
use nettica_api::{ApiClient, Target};

use super::collection::{Keyed, ResourceCollection, Snapshot};
use super::feedback::{Feedback, FeedbackSlot};
use crate::error::CoreError;
use crate::model::Observed;
use crate::stream::EntityStream;

/// Mutation verbs used in success notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

/// A [`Resource`] that can live in a [`ResourceStore`].
pub trait StoredResource: Resource + Keyed {
    /// Success message for `action` on this record.
    fn notice(&self, action: Action) -> String;

    /// Recompute client-side fields after a full read.
    fn derive(&mut self, _now: DateTime<Utc>, _window: Duration) {}
}

impl StoredResource for Device {
    fn notice(&self, action: Action) -> String {
        format!("Device {action}")
    }

    fn derive(&mut self, now: DateTime<Utc>, window: Duration) {
        self.observe(now, window);
    }
}

impl StoredResource for Vpn {
    fn notice(&self, action: Action) -> String {
        format!("VPN {action}")
    }

    fn derive(&mut self, now: DateTime<Utc>, window: Duration) {
        self.observe(now, window);
    }
}

impl StoredResource for Net {
    fn notice(&self, action: Action) -> String {
        format!("Network {} {action}", self.net_name)
    }
}

/// Cache plus operations for one resource kind on one target.
pub struct ResourceStore<R: StoredResource> {
    api: Arc<ApiClient>,
    target: Target,
    liveness_window: Duration,
    items: ResourceCollection<R>,
    feedback: FeedbackSlot,
}

impl<R: StoredResource> ResourceStore<R> {
    pub(crate) fn new(api: Arc<ApiClient>, target: Target, liveness_window: Duration) -> Self {
        Self {
            api,
            target,
            liveness_window,
            items: ResourceCollection::new(),
            feedback: FeedbackSlot::new(R::KIND),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch the full collection and replace the cache with it.
    pub async fn read_all(&self) -> Result<Snapshot<R>, CoreError> {
        let mut items: Vec<R> = self
            .api
            .list(self.target)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;

        let now = Utc::now();
        for item in &mut items {
            item.derive(now, self.liveness_window);
        }
        debug!(kind = R::KIND, target = %self.target, count = items.len(), "collection refreshed");

        self.items.replace_all(items);
        self.feedback.clear();
        Ok(self.items.snapshot())
    }

    /// Create `item` on the server and cache the echoed record.
    pub async fn create(&self, item: &R) -> Result<Arc<R>, CoreError> {
        let created: R = self
            .api
            .create(self.target, item)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;

        let id = created.id().to_owned();
        if !self.items.upsert(created) {
            debug!(kind = R::KIND, %id, "created record already cached, replaced");
        }
        self.feedback.notice(item.notice(Action::Created));
        self.cached(&id)
    }

    /// PATCH `item` and replace the cached entry with the echoed record.
    ///
    /// If the id is not cached the server change stands but the cache is
    /// left untouched and `NotFound` is returned.
    pub async fn update(&self, item: &R) -> Result<Arc<R>, CoreError> {
        let updated: R = self
            .api
            .update(self.target, item)
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;

        let id = updated.id().to_owned();
        if !self.items.replace(updated) {
            return Err(self.feedback.fail(CoreError::not_found("update", R::KIND, id)));
        }
        self.feedback.notice(item.notice(Action::Updated));
        self.cached(&id)
    }

    /// DELETE `item` and drop it from the cache.
    pub async fn delete(&self, item: &R) -> Result<(), CoreError> {
        self.api
            .remove::<R>(self.target, item.id())
            .await
            .map_err(|e| self.feedback.fail(e.into()))?;

        if self.items.remove(item.id()).is_none() {
            return Err(self
                .feedback
                .fail(CoreError::not_found("delete", R::KIND, item.id())));
        }
        self.feedback.notice(item.notice(Action::Deleted));
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<Arc<R>> {
        self.items.get(id)
    }

    pub fn snapshot(&self) -> Snapshot<R> {
        self.items.snapshot()
    }

    pub fn subscribe(&self) -> EntityStream<R> {
        EntityStream::new(self.items.subscribe())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback.current()
    }

    pub fn last_error(&self) -> Option<String> {
        self.feedback.last_error()
    }

    pub fn subscribe_feedback(&self) -> tokio::sync::watch::Receiver<Option<Feedback>> {
        self.feedback.subscribe()
    }

    // ── Crate-internal ───────────────────────────────────────────────

    pub(crate) fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub(crate) fn feedback_slot(&self) -> &FeedbackSlot {
        &self.feedback
    }

    fn cached(&self, id: &str) -> Result<Arc<R>, CoreError> {
        self.items.get(id).ok_or_else(|| {
            warn!(kind = R::KIND, %id, "record vanished right after caching");
            CoreError::Internal(format!("{} {id} missing from cache", R::KIND))
        })
    }
}
