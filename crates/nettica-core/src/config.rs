// ── Runtime console configuration ──
//
// These types describe *how* to reach a console. They never touch disk:
// nettica-config builds a `ConsoleConfig` from a profile and hands it in.

use std::time::Duration;

use url::Url;

use nettica_api::{TlsMode, TransportConfig};

/// How long a device may go without checking in before it is reported
/// offline.
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one console session.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Primary console origin, used until a server is persisted in the
    /// credential store (e.g. `https://my.nettica.com`).
    pub server: Option<Url>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
    /// Staleness threshold for device/VPN liveness.
    pub liveness_window: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            liveness_window: DEFAULT_LIVENESS_WINDOW,
        }
    }
}

impl ConsoleConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
