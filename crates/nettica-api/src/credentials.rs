// Persistent credential slots
//
// The console keeps its session material in a small, fixed set of named
// slots. Stores are synchronous and total: an implementation that fails to
// persist logs the failure and carries on, it never surfaces an error.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// One named credential slot.
///
/// The string form (`token`, `wild_token`, ...) is the key used by durable
/// stores, so it must stay stable across releases.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CredentialSlot {
    /// Bearer token for the primary server.
    Token,
    /// Bearer token for the federated ("wild") server.
    WildToken,
    /// Origin of the primary server.
    Server,
    /// Origin of the federated server.
    WildServer,
    /// OAuth client id handed out by `/auth/oauth2_url`.
    ClientId,
    /// OAuth state nonce.
    State,
    /// OAuth authorization code.
    Code,
    Referer,
    RedirectUri,
}

/// Durable key/value storage over [`CredentialSlot`]s.
///
/// Implementations never fail from the caller's point of view. `get` on an
/// absent slot returns `None`.
pub trait CredentialStore: Send + Sync {
    fn get(&self, slot: CredentialSlot) -> Option<String>;

    fn save(&self, slot: CredentialSlot, value: &str);

    fn destroy(&self, slot: CredentialSlot);

    /// Like [`get`](Self::get), but treats an empty value as absent.
    fn get_present(&self, slot: CredentialSlot) -> Option<String> {
        self.get(slot).filter(|v| !v.is_empty())
    }

    /// Destroy every slot.
    fn clear(&self) {
        for slot in CredentialSlot::iter() {
            self.destroy(slot);
        }
    }
}

/// In-process credential store. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slots: DashMap<CredentialSlot, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots currently holding a value.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, slot: CredentialSlot) -> Option<String> {
        self.slots.get(&slot).map(|v| v.value().clone())
    }

    fn save(&self, slot: CredentialSlot, value: &str) {
        self.slots.insert(slot, value.to_owned());
    }

    fn destroy(&self, slot: CredentialSlot) {
        self.slots.remove(&slot);
    }
}
