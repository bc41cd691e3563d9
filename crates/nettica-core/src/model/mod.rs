// ── Domain model ──
//
// Records are the typed wire models from nettica-api; this module adds the
// client-side derivations computed on top of them.

pub mod liveness;

pub use liveness::{NATIVE_PLATFORMS, Observed, classify};
pub use nettica_api::models::{
    Account, ArtifactKind, AuthUrl, Device, ExchangeRequest, Limits, Liveness, Net, Resource,
    User, Vpn,
};
