// ── Peer stores (devices and VPNs) ──
//
// Devices and VPN memberships both produce WireGuard peer configs, so
// besides CRUD they carry per-record QR code and config-file caches and
// can e-mail their config to the owner.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use nettica_api::models::ArtifactKind;
use nettica_api::{ApiClient, Target};

use super::artifacts::{ArtifactCache, PLACEHOLDER_PNG_BASE64};
use super::collection::Snapshot;
use super::feedback::Feedback;
use super::resource::{ResourceStore, StoredResource};
use crate::error::CoreError;
use crate::stream::EntityStream;

pub struct PeerStore<R: StoredResource> {
    records: ResourceStore<R>,
    qrcodes: ArtifactCache,
    configs: ArtifactCache,
}

impl<R: StoredResource> PeerStore<R> {
    pub(crate) fn new(api: Arc<ApiClient>, liveness_window: Duration) -> Self {
        Self {
            records: ResourceStore::new(api, Target::Primary, liveness_window),
            qrcodes: ArtifactCache::new(),
            configs: ArtifactCache::new(),
        }
    }

    // ── CRUD ─────────────────────────────────────────────────────────

    /// Fetch every record and classify its liveness.
    pub async fn read_all(&self) -> Result<Snapshot<R>, CoreError> {
        self.records.read_all().await
    }

    pub async fn create(&self, item: &R) -> Result<Arc<R>, CoreError> {
        self.records.create(item).await
    }

    pub async fn update(&self, item: &R) -> Result<Arc<R>, CoreError> {
        self.records.update(item).await
    }

    /// Delete `item` and drop its cached artifacts.
    pub async fn delete(&self, item: &R) -> Result<(), CoreError> {
        self.records.delete(item).await?;
        self.qrcodes.remove(item.id());
        self.configs.remove(item.id());
        Ok(())
    }

    // ── Artifacts ────────────────────────────────────────────────────

    /// Fetch the QR code PNG for `item`, replacing any cached one.
    pub async fn read_qrcode(&self, item: &R) -> Result<Bytes, CoreError> {
        self.fetch(item.id(), ArtifactKind::QrCode).await
    }

    /// Fetch the config file for `item`, replacing any cached one.
    pub async fn read_config(&self, item: &R) -> Result<Bytes, CoreError> {
        self.fetch(item.id(), ArtifactKind::Config).await
    }

    /// Fetch QR codes for every cached record. Keeps going past failures
    /// and returns the last one.
    pub async fn read_qrcodes(&self) -> Result<(), CoreError> {
        self.fetch_all(ArtifactKind::QrCode).await
    }

    pub async fn read_configs(&self) -> Result<(), CoreError> {
        self.fetch_all(ArtifactKind::Config).await
    }

    /// Ask the server to e-mail the config for `item`.
    pub async fn email(&self, item: &R) -> Result<(), CoreError> {
        let feedback = self.records.feedback_slot();
        self.records
            .api()
            .email::<R>(Target::Primary, item.id())
            .await
            .map_err(|e| feedback.fail(e.into()))?;
        feedback.clear();
        Ok(())
    }

    pub fn qrcode(&self, id: &str) -> Option<Bytes> {
        self.qrcodes.get(id)
    }

    /// Base64 QR code for `id`, or a transparent 1x1 PNG until one has
    /// been fetched.
    pub fn qrcode_base64_or_placeholder(&self, id: &str) -> String {
        self.qrcodes
            .get_base64(id)
            .unwrap_or_else(|| PLACEHOLDER_PNG_BASE64.to_owned())
    }

    pub fn config(&self, id: &str) -> Option<Bytes> {
        self.configs.get(id)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<Arc<R>> {
        self.records.get(id)
    }

    pub fn snapshot(&self) -> Snapshot<R> {
        self.records.snapshot()
    }

    pub fn subscribe(&self) -> EntityStream<R> {
        self.records.subscribe()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.records.feedback()
    }

    pub fn last_error(&self) -> Option<String> {
        self.records.last_error()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn cache(&self, kind: ArtifactKind) -> &ArtifactCache {
        match kind {
            ArtifactKind::QrCode => &self.qrcodes,
            ArtifactKind::Config => &self.configs,
        }
    }

    async fn fetch(&self, id: &str, kind: ArtifactKind) -> Result<Bytes, CoreError> {
        let artifact = self
            .records
            .api()
            .artifact::<R>(Target::Primary, id, kind)
            .await
            .map_err(|e| self.records.feedback_slot().fail(e.into()))?;
        self.cache(kind).put(id, artifact.clone());
        Ok(artifact)
    }

    async fn fetch_all(&self, kind: ArtifactKind) -> Result<(), CoreError> {
        let mut last_err = None;
        let items = self.records.snapshot();
        for item in items.as_slice() {
            if let Err(e) = self.fetch(item.id(), kind).await {
                last_err = Some(e);
            }
        }
        last_err.map_or(Ok(()), Err)
    }
}
