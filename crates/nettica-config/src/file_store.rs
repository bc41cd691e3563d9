// ── Durable credential store ──
//
// Session credentials in a small TOML file, one key per slot. The file is
// rewritten on every mutation via write-to-temp-then-rename, so a crash
// never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use nettica_api::{CredentialSlot, CredentialStore};

use crate::ConfigError;

/// [`CredentialStore`] persisted to a TOML file.
///
/// Persistence failures are logged and otherwise ignored; the in-memory
/// view stays authoritative for the life of the process.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    slots: Mutex<BTreeMap<CredentialSlot, String>>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading any existing contents. A missing
    /// file is an empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let slots = match std::fs::read_to_string(&path) {
            Ok(text) => parse(&path, &text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), slots = slots.len(), "credential store opened");
        Ok(Self {
            path,
            slots: Mutex::new(slots),
        })
    }

    /// Open the store at the platform data directory.
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::open(crate::credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut BTreeMap<CredentialSlot, String>) -> T) -> T {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut slots)
    }

    fn persist(&self, slots: &BTreeMap<CredentialSlot, String>) {
        if let Err(e) = write_atomic(&self.path, slots) {
            warn!(path = %self.path.display(), error = %e, "failed to persist credentials");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, slot: CredentialSlot) -> Option<String> {
        self.with_slots(|slots| slots.get(&slot).cloned())
    }

    fn save(&self, slot: CredentialSlot, value: &str) {
        self.with_slots(|slots| {
            slots.insert(slot, value.to_owned());
            self.persist(slots);
        });
    }

    fn destroy(&self, slot: CredentialSlot) {
        self.with_slots(|slots| {
            if slots.remove(&slot).is_some() {
                self.persist(slots);
            }
        });
    }

    fn clear(&self) {
        self.with_slots(|slots| {
            if !slots.is_empty() {
                slots.clear();
                self.persist(slots);
            }
        });
    }
}

fn parse(path: &Path, text: &str) -> Result<BTreeMap<CredentialSlot, String>, ConfigError> {
    let raw: BTreeMap<String, String> = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut slots = BTreeMap::new();
    for (key, value) in raw {
        if let Ok(slot) = CredentialSlot::from_str(&key) {
            slots.insert(slot, value);
        } else {
            warn!(%key, "ignoring unknown credential key");
        }
    }
    Ok(slots)
}

fn write_atomic(path: &Path, slots: &BTreeMap<CredentialSlot, String>) -> Result<(), ConfigError> {
    let raw: BTreeMap<&str, &str> = slots
        .iter()
        .map(|(slot, value)| (slot.as_ref(), value.as_str()))
        .collect();
    let text = toml::to_string(&raw)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, text)?;
    restrict_permissions(&tmp)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds").join("credentials.toml");

        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.get(CredentialSlot::Token), None);
        store.save(CredentialSlot::Token, "t1");
        store.save(CredentialSlot::WildServer, "https://wild.example");
        drop(store);

        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.get(CredentialSlot::Token).as_deref(), Some("t1"));
        assert_eq!(
            store.get(CredentialSlot::WildServer).as_deref(),
            Some("https://wild.example")
        );

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("wild_server = \"https://wild.example\""));
    }

    #[test]
    fn clear_empties_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");

        let store = FileCredentialStore::open(&path).unwrap();
        store.save(CredentialSlot::Token, "t1");
        store.save(CredentialSlot::ClientId, "c1");
        store.destroy(CredentialSlot::ClientId);
        assert_eq!(store.get(CredentialSlot::ClientId), None);

        store.clear();
        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get(CredentialSlot::Token), None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "token = \"t\"\nlegacy_cookie = \"x\"\n").unwrap();

        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.get(CredentialSlot::Token).as_deref(), Some("t"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "token = ").unwrap();

        let err = FileCredentialStore::open(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
