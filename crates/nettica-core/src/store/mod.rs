// ── Client-side stores ──
//
// One store per resource family, each owning its cached collections and
// a feedback slot. Stores share the `ApiClient` and never call each other.

mod accounts;
mod artifacts;
mod collection;
mod feedback;
mod join;
mod peers;
mod resource;
mod wild;

pub use accounts::AccountStore;
pub use artifacts::PLACEHOLDER_PNG_BASE64;
pub use collection::{Keyed, Scoped, Snapshot};
pub use feedback::Feedback;
pub(crate) use feedback::FeedbackSlot;
pub use join::JoinStore;
pub use peers::PeerStore;
pub use resource::{Action, ResourceStore, StoredResource};
pub use wild::WildNetStore;
