// ── Federated network store ──
//
// Networks shared from another organisation's console. Every request goes
// to the wild target, whose server and token live in their own credential
// slots, so this store never disturbs the primary session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use nettica_api::models::Net;
use nettica_api::{ApiClient, CredentialSlot, Target};

use super::collection::Snapshot;
use super::feedback::Feedback;
use super::resource::ResourceStore;
use crate::error::CoreError;
use crate::stream::EntityStream;

pub struct WildNetStore {
    nets: ResourceStore<Net>,
    server_error: watch::Sender<Option<String>>,
}

impl WildNetStore {
    pub(crate) fn new(api: Arc<ApiClient>, liveness_window: Duration) -> Self {
        let (server_error, _) = watch::channel(None);
        Self {
            nets: ResourceStore::new(api, Target::Wild, liveness_window),
            server_error,
        }
    }

    // ── Server selection ─────────────────────────────────────────────

    /// The federated server currently selected, if any.
    pub fn server(&self) -> Option<String> {
        self.nets
            .api()
            .credentials()
            .get_present(CredentialSlot::WildServer)
    }

    /// Select the federated server and persist the choice.
    pub fn set_server(&self, server: &str) {
        info!(server, "federated server selected");
        self.nets
            .api()
            .credentials()
            .save(CredentialSlot::WildServer, server);
    }

    /// Problem reaching or authenticating with the federated server,
    /// kept apart from per-operation feedback.
    pub fn server_error(&self) -> Option<String> {
        self.server_error.borrow().clone()
    }

    pub fn set_server_error(&self, error: Option<String>) {
        self.server_error.send_modify(|slot| *slot = error);
    }

    pub fn subscribe_server_error(&self) -> watch::Receiver<Option<String>> {
        self.server_error.subscribe()
    }

    // ── CRUD ─────────────────────────────────────────────────────────

    pub async fn read_all(&self) -> Result<Snapshot<Net>, CoreError> {
        self.nets.read_all().await
    }

    pub async fn create(&self, net: &Net) -> Result<Arc<Net>, CoreError> {
        self.nets.create(net).await
    }

    pub async fn update(&self, net: &Net) -> Result<Arc<Net>, CoreError> {
        self.nets.update(net).await
    }

    pub async fn delete(&self, net: &Net) -> Result<(), CoreError> {
        self.nets.delete(net).await
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<Arc<Net>> {
        self.nets.get(id)
    }

    pub fn snapshot(&self) -> Snapshot<Net> {
        self.nets.snapshot()
    }

    pub fn subscribe(&self) -> EntityStream<Net> {
        self.nets.subscribe()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.nets.feedback()
    }

    pub fn last_error(&self) -> Option<String> {
        self.nets.last_error()
    }
}
