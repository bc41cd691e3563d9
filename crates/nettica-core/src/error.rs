// ── Core error types ──
//
// User-facing errors from nettica-core. Consumers never see reqwest or
// serde failures directly: the `From<nettica_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach console at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Console request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    /// A local reconcile found no cached entry to update or delete.
    #[error("{operation} {entity_type} failed, {identifier} not in list")]
    NotFound {
        operation: &'static str,
        entity_type: &'static str,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{message}")]
    Api {
        message: String,
        /// HTTP status code (if a response was received).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(
        operation: &'static str,
        entity_type: &'static str,
        identifier: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            operation,
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Returns `true` for local "not in list" reconcile failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nettica_api::Error> for CoreError {
    fn from(err: nettica_api::Error) -> Self {
        match err {
            nettica_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            nettica_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            nettica_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nettica_api::Error::MissingServer { target } => CoreError::Config {
                message: format!("no server configured for the {target} target"),
            },
            nettica_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            nettica_api::Error::Api { status, message } => CoreError::Api {
                message: message.unwrap_or_else(|| format!("request failed (HTTP {status})")),
                status: Some(status),
            },
            nettica_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
