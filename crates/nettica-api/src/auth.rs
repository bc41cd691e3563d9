use secrecy::SecretString;
use url::Url;

use crate::credentials::{CredentialSlot, CredentialStore};
use crate::error::Error;

/// Path prefix every console endpoint lives under.
pub const API_PREFIX: &str = "/api/v1.0";

/// Which backend a request is addressed to.
///
/// Every gateway call names its target explicitly; the base URL and bearer
/// token are looked up for that target when the request is built, so calls
/// against both backends can be in flight at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    /// The console the user logged into.
    Primary,
    /// A federated ("wild") console used for cross-organisation sharing.
    Wild,
}

impl Target {
    /// Credential slot holding this target's server origin.
    pub fn server_slot(self) -> CredentialSlot {
        match self {
            Self::Primary => CredentialSlot::Server,
            Self::Wild => CredentialSlot::WildServer,
        }
    }

    /// Credential slot holding this target's bearer token.
    pub fn token_slot(self) -> CredentialSlot {
        match self {
            Self::Primary => CredentialSlot::Token,
            Self::Wild => CredentialSlot::WildToken,
        }
    }
}

/// Immutable request configuration for one target: base URL plus bearer
/// token, captured at the moment a request is built.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: Url,
    token: Option<SecretString>,
}

impl Endpoint {
    /// Build an endpoint from a server origin.
    ///
    /// `https://host` and `https://host/` both become
    /// `https://host/api/v1.0`; an origin that already carries the prefix
    /// is kept as is.
    pub fn new(server: &str, token: Option<SecretString>) -> Result<Self, Error> {
        let mut base_url = Url::parse(server.trim())?;
        let path = base_url.path().trim_end_matches('/').to_owned();
        if path.ends_with(API_PREFIX) {
            base_url.set_path(&path);
        } else {
            base_url.set_path(&format!("{path}{API_PREFIX}"));
        }
        Ok(Self { base_url, token })
    }

    /// Snapshot the configuration for `target` from the credential store.
    ///
    /// The primary target falls back to `default_server` when no server has
    /// been persisted; the wild target has no fallback.
    pub fn resolve(
        credentials: &dyn CredentialStore,
        target: Target,
        default_server: Option<&Url>,
    ) -> Result<Self, Error> {
        let server = credentials
            .get_present(target.server_slot())
            .or_else(|| match target {
                Target::Primary => default_server.map(Url::to_string),
                Target::Wild => None,
            })
            .ok_or(Error::MissingServer { target })?;

        let token = credentials
            .get_present(target.token_slot())
            .map(SecretString::from);

        Self::new(&server, token)
    }

    /// Full URL for an API path such as `/device/{id}`.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}
