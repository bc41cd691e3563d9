// ── Binary artifact cache ──
//
// QR code images and config files fetched per record, keyed by record id.
// A fetch always replaces the previous artifact for that id.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use dashmap::DashMap;

/// A 1x1 transparent PNG, base64-encoded. Shown while a QR code is still
/// loading.
pub const PLACEHOLDER_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+P+/HgAFhAJ/wlseKgAAAABJRU5ErkJggg==";

#[derive(Default)]
pub(crate) struct ArtifactCache {
    by_id: DashMap<String, Bytes>,
}

impl ArtifactCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(&self, id: &str, artifact: Bytes) {
        self.by_id.insert(id.to_owned(), artifact);
    }

    pub(crate) fn get(&self, id: &str) -> Option<Bytes> {
        self.by_id.get(id).map(|r| r.value().clone())
    }

    pub(crate) fn get_base64(&self, id: &str) -> Option<String> {
        self.by_id.get(id).map(|r| STANDARD.encode(r.value()))
    }

    pub(crate) fn remove(&self, id: &str) {
        self.by_id.remove(id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces_previous_artifact() {
        let cache = ArtifactCache::new();
        cache.put("d1", Bytes::from_static(b"old"));
        cache.put("d1", Bytes::from_static(b"new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("d1"), Some(Bytes::from_static(b"new")));
        assert_eq!(cache.get_base64("d1").as_deref(), Some("bmV3"));

        cache.remove("d1");
        assert_eq!(cache.get("d1"), None);
    }

    #[test]
    fn placeholder_is_a_png() {
        let raw = STANDARD.decode(PLACEHOLDER_PNG_BASE64).unwrap_or_default();
        assert!(raw.starts_with(b"\x89PNG"));
    }
}
