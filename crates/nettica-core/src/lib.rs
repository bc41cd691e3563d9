//! Client-side state for a Nettica console, between `nettica-api` and UI
//! consumers.
//!
//! - **[`Console`]**: facade owning the API client, the auth [`Session`]
//!   and one store per resource family. Cheap to clone.
//!
//! - **[`Session`]**: OAuth-style handshake (`oauth2_url`, `login`,
//!   `oauth2_exchange`) against the primary console or a federated one.
//!   Any auth failure fails closed and clears every credential slot.
//!
//! - **Stores** ([`store`]): optimistic caches built on `tokio::sync::watch`
//!   snapshots. Full reads replace a collection, mutations patch it with
//!   the server's echo. Every store exposes an [`EntityStream`] and a
//!   [`Feedback`] slot holding the outcome of its last operation.
//!
//! - **Liveness** ([`model::liveness`]): devices and VPNs are classified
//!   Online, Offline or Native from their last check-in.

pub mod config;
pub mod console;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConsoleConfig, DEFAULT_LIVENESS_WINDOW, TlsVerification};
pub use console::Console;
pub use error::CoreError;
pub use session::{AuthFlow, AuthStatus, Session, SessionState};
pub use store::{
    AccountStore, Feedback, JoinStore, PeerStore, ResourceStore, Scoped, Snapshot, WildNetStore,
};
pub use stream::EntityStream;

pub use model::{Account, Device, Liveness, Net, User, Vpn};
pub use nettica_api::{CredentialSlot, CredentialStore, MemoryCredentialStore, Target};
