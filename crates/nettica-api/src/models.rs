// Wire models for the console REST API
//
// Every response is decoded into one of these types before it leaves the
// crate, so store logic never handles untyped JSON. Records keep any
// field this crate does not model in `extra`, so a record fetched from the
// server can be PATCHed back without dropping data.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Resource trait ──────────────────────────────────────────────────

/// A server-owned record with a stable string id, addressable under a
/// collection path (`/device`, `/vpn`, ...).
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Singular, lowercase name used in messages ("device", "network").
    const KIND: &'static str;
    /// Collection path relative to the API prefix.
    const PATH: &'static str;

    fn id(&self) -> &str;

    /// Human-readable name for feedback messages.
    fn label(&self) -> &str;
}

// ── Serde helpers ───────────────────────────────────────────────────

/// Reject records without a usable id.
fn non_empty_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let id = String::deserialize(d)?;
    if id.trim().is_empty() {
        return Err(serde::de::Error::custom("record id must not be empty"));
    }
    Ok(id)
}

/// Treat an explicit `null` like a missing field (Go encodes nil slices as null).
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ── Derived display state ───────────────────────────────────────────

/// Connectivity classification derived client-side from `lastSeen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum Liveness {
    Online,
    Offline,
    /// Checks in through a native OS client rather than the agent, so a
    /// stale `lastSeen` is expected.
    Native,
}

/// Which binary artifact to fetch from a `/config` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactKind {
    /// PNG QR code of the peer configuration.
    QrCode,
    /// Downloadable configuration file.
    Config,
}

impl ArtifactKind {
    /// Value of the `qrcode` query parameter.
    pub fn qrcode_param(self) -> &'static str {
        match self {
            Self::QrCode => "true",
            Self::Config => "false",
        }
    }
}

// ── Device ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Device {
    #[serde(deserialize_with = "non_empty_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "accountid", default)]
    pub account_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub enable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(rename = "arch", default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<i64>,
    #[serde(default)]
    pub registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Filled in by the device store on every full read.
    #[serde(skip)]
    pub status: Option<Liveness>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Device {
    const KIND: &'static str = "device";
    const PATH: &'static str = "/device";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

// ── VPN ─────────────────────────────────────────────────────────────

/// A device's membership in a network, with its peer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpn {
    #[serde(deserialize_with = "non_empty_id")]
    pub id: String,
    #[serde(rename = "accountid", default)]
    pub account_id: String,
    #[serde(rename = "deviceid", default)]
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "netid", default)]
    pub net_id: String,
    #[serde(default)]
    pub net_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub vpn_type: Option<String>,
    #[serde(default)]
    pub failover: i32,
    #[serde(default)]
    pub fail_count: i32,
    #[serde(default)]
    pub enable: bool,
    #[serde(rename = "readonly", default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Effective peer settings (addresses, keys, endpoint); opaque here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub status: Option<Liveness>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Vpn {
    const KIND: &'static str = "vpn";
    const PATH: &'static str = "/vpn";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

// ── Network ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Net {
    #[serde(deserialize_with = "non_empty_id")]
    pub id: String,
    #[serde(rename = "accountid", default)]
    pub account_id: String,
    #[serde(default)]
    pub net_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Net {
    const KIND: &'static str = "network";
    const PATH: &'static str = "/net";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.net_name
    }
}

// ── Account ─────────────────────────────────────────────────────────

/// A user's membership in an organisation. Root accounts have
/// `id == parent`; members of someone else's account do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(deserialize_with = "non_empty_id")]
    pub id: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub net_id: String,
    #[serde(default)]
    pub net_name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    pub fn is_root(&self) -> bool {
        self.id == self.parent
    }
}

impl Resource for Account {
    const KIND: &'static str = "account";
    const PATH: &'static str = "/accounts";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.email
    }
}

/// Usage counters and quotas for one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "accountid", default)]
    pub account_id: String,
    #[serde(default)]
    pub devices: i64,
    #[serde(rename = "maxdevices", default)]
    pub max_devices: i64,
    #[serde(default)]
    pub networks: i64,
    #[serde(rename = "maxnetworks", default)]
    pub max_networks: i64,
    #[serde(default)]
    pub members: i64,
    #[serde(rename = "maxmembers", default)]
    pub max_members: i64,
    #[serde(default)]
    pub services: i64,
    #[serde(rename = "maxservices", default)]
    pub max_services: i64,
    #[serde(default)]
    pub tolerance: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Auth ────────────────────────────────────────────────────────────

/// The authenticated principal returned by `/auth/user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(rename = "iss", default)]
    pub issuer: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /auth/oauth2_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrl {
    pub code_url: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "redirect_uri", default)]
    pub redirect_uri: Option<String>,
}

/// Body of `POST /auth/login`. The credentials travel base64-encoded in
/// `code`, shaped like an OAuth authorization request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicLogin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub code: String,
    pub state: String,
    #[serde(rename = "redirect_uri", skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

impl BasicLogin {
    /// State value the server accepts without a prior `oauth2_url` round-trip.
    pub const BASIC_STATE: &'static str = "basic_auth";

    pub fn new(username: &str, password: &SecretString) -> Self {
        let code = STANDARD.encode(format!("{username}:{}", password.expose_secret()));
        Self {
            client_id: None,
            code,
            state: Self::BASIC_STATE.to_owned(),
            redirect_uri: None,
        }
    }
}

/// Response of `POST /auth/login`: an authorization code to exchange,
/// mimicking an OAuth redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginGrant {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "redirect_uri", default)]
    pub redirect_uri: Option<String>,
}

/// Body of `POST /auth/oauth2_exchange`.
///
/// `server` is set for a federated exchange: the request goes to that
/// server and the resulting token belongs to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub code: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl ExchangeRequest {
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: state.into(),
            client_id: None,
            server: None,
        }
    }

    /// Address the exchange to a federated server.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn device_decodes_go_nulls_and_keeps_unknown_fields() {
        let device: Device = serde_json::from_value(json!({
            "id": "d1",
            "accountid": "a1",
            "name": "laptop",
            "tags": null,
            "platform": "Linux",
            "arch": "amd64",
            "lastSeen": "2024-06-15T10:30:00.123456789-05:00",
            "ezcode": "xyz"
        }))
        .unwrap();

        assert_eq!(device.account_id, "a1");
        assert!(device.tags.is_empty());
        assert_eq!(device.architecture.as_deref(), Some("amd64"));
        assert_eq!(
            device.last_seen.unwrap().to_rfc3339(),
            "2024-06-15T15:30:00.123456789+00:00"
        );
        assert_eq!(device.extra.get("ezcode"), Some(&json!("xyz")));

        let back = serde_json::to_value(&device).unwrap();
        assert_eq!(back["ezcode"], json!("xyz"));
        assert_eq!(back["accountid"], json!("a1"));
        assert!(back.get("status").is_none());
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = serde_json::from_value::<Net>(json!({ "id": "", "netName": "lan" }));
        assert!(err.is_err());
        let err = serde_json::from_value::<Net>(json!({ "netName": "lan" }));
        assert!(err.is_err());
    }

    #[test]
    fn basic_login_encodes_credentials() {
        let password: SecretString = "hunter2".to_string().into();
        let body = serde_json::to_value(BasicLogin::new("alice", &password)).unwrap();
        assert_eq!(
            body,
            json!({ "code": "YWxpY2U6aHVudGVyMg==", "state": "basic_auth" })
        );
    }

    #[test]
    fn exchange_request_omits_absent_fields() {
        let body = serde_json::to_value(ExchangeRequest::new("", "s1")).unwrap();
        assert_eq!(body, json!({ "code": "", "state": "s1" }));

        let body = serde_json::to_value(
            ExchangeRequest::new("c", "s")
                .with_client_id("cid")
                .with_server("https://wild.example"),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "code": "c",
                "state": "s",
                "clientId": "cid",
                "server": "https://wild.example"
            })
        );
    }

    #[test]
    fn root_account_detection() {
        let root = Account {
            id: "a".into(),
            parent: "a".into(),
            ..Account::default()
        };
        let member = Account {
            id: "b".into(),
            parent: "a".into(),
            ..Account::default()
        };
        assert!(root.is_root());
        assert!(!member.is_root());
    }
}
