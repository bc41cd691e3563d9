// ── Per-store feedback slot ──
//
// Holds the outcome of the most recent operation for display. Each
// operation overwrites it; nothing is queued.

use tokio::sync::watch;
use tracing::warn;

use crate::error::CoreError;

/// Human-readable outcome of the last operation on a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// A success message, e.g. "Device created".
    Notice(String),
    Error(String),
}

impl Feedback {
    pub fn message(&self) -> &str {
        match self {
            Self::Notice(m) | Self::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

pub(crate) struct FeedbackSlot {
    scope: &'static str,
    slot: watch::Sender<Option<Feedback>>,
}

impl FeedbackSlot {
    pub(crate) fn new(scope: &'static str) -> Self {
        let (slot, _) = watch::channel(None);
        Self { scope, slot }
    }

    pub(crate) fn notice(&self, message: impl Into<String>) {
        self.set(Some(Feedback::Notice(message.into())));
    }

    /// Record `err` and hand it back for propagation.
    pub(crate) fn fail(&self, err: CoreError) -> CoreError {
        warn!(scope = self.scope, error = %err, "operation failed");
        self.set(Some(Feedback::Error(err.to_string())));
        err
    }

    pub(crate) fn clear(&self) {
        self.set(None);
    }

    pub(crate) fn current(&self) -> Option<Feedback> {
        self.slot.borrow().clone()
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        match &*self.slot.borrow() {
            Some(Feedback::Error(m)) => Some(m.clone()),
            _ => None,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<Feedback>> {
        self.slot.subscribe()
    }

    fn set(&self, value: Option<Feedback>) {
        self.slot.send_modify(|slot| *slot = value);
    }
}
