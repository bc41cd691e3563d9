// nettica-api: Async Rust client for the Nettica console REST API

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod models;
pub mod transport;

mod accounts;
mod resources;
mod session;

pub use auth::{API_PREFIX, Endpoint, Target};
pub use client::ApiClient;
pub use credentials::{CredentialSlot, CredentialStore, MemoryCredentialStore};
pub use error::Error;
pub use models::{
    Account, ArtifactKind, AuthUrl, BasicLogin, Device, ExchangeRequest, Limits, Liveness,
    LoginGrant, Net, Resource, User, Vpn,
};
pub use transport::{TlsMode, TransportConfig};
