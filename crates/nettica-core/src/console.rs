// ── Console facade ──
//
// Owns the API client and every store for one console. Cloning is cheap
// and all clones share the same state.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use nettica_api::models::{Device, Net, Vpn};
use nettica_api::{ApiClient, CredentialStore};

use crate::config::ConsoleConfig;
use crate::error::CoreError;
use crate::session::Session;
use crate::store::{AccountStore, JoinStore, PeerStore, ResourceStore, WildNetStore};

#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    api: Arc<ApiClient>,
    session: Session,
    accounts: AccountStore,
    devices: PeerStore<Device>,
    vpns: PeerStore<Vpn>,
    nets: ResourceStore<Net>,
    wild_nets: WildNetStore,
    join: JoinStore,
}

impl Console {
    /// Build a console over `credentials` with an HTTP client configured
    /// from `config`.
    pub fn new(
        config: ConsoleConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, CoreError> {
        let api = ApiClient::new(credentials, config.server.clone(), &config.transport())?;
        Ok(Self::with_api(config, api))
    }

    /// Build a console around an existing `ApiClient`.
    pub fn with_api(config: ConsoleConfig, api: ApiClient) -> Self {
        debug!(server = ?config.server.as_ref().map(Url::as_str), "console ready");
        let api = Arc::new(api);
        let window = config.liveness_window;
        let inner = ConsoleInner {
            session: Session::new(Arc::clone(&api)),
            accounts: AccountStore::new(Arc::clone(&api)),
            devices: PeerStore::new(Arc::clone(&api), window),
            vpns: PeerStore::new(Arc::clone(&api), window),
            nets: ResourceStore::new(Arc::clone(&api), nettica_api::Target::Primary, window),
            wild_nets: WildNetStore::new(Arc::clone(&api), window),
            join: JoinStore::new(Arc::clone(&api)),
            api,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.inner.api.credentials()
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.inner.accounts
    }

    pub fn devices(&self) -> &PeerStore<Device> {
        &self.inner.devices
    }

    pub fn vpns(&self) -> &PeerStore<Vpn> {
        &self.inner.vpns
    }

    pub fn nets(&self) -> &ResourceStore<Net> {
        &self.inner.nets
    }

    /// Networks on the federated server.
    pub fn wild_nets(&self) -> &WildNetStore {
        &self.inner.wild_nets
    }

    pub fn join(&self) -> &JoinStore {
        &self.inner.join
    }
}
